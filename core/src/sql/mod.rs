//! SQL lowering: a `ParsedParams` plus a target table becomes a
//! parameterized `SELECT`.
//!
//! Two rules hold for every emission path:
//!
//! - every identifier (table, column, alias) is wrapped in `"…"` with
//!   embedded `"` doubled, and never becomes part of a parameter;
//! - every value travels as a `$n` positional parameter and is never
//!   inlined into the SQL text.
//!
//! ## Operator lowering
//!
//! | operator | positive              | negated                |
//! |----------|-----------------------|------------------------|
//! | eq       | `f = $n`              | `f <> $n`              |
//! | gt       | `f > $n`              | `f <= $n`              |
//! | like     | `f LIKE $n`           | `f NOT LIKE $n`        |
//! | match    | `f ~ $n`              | `f !~ $n`              |
//! | in       | `f = ANY($n)`         | `NOT f = ANY($n)`      |
//! | cs       | `f @> $n`             | `NOT f @> $n`          |
//! | fts      | `f @@ to_tsquery($n)` | `NOT f @@ to_tsquery($n)` |
//!
//! Comparison and pattern operators negate algebraically; set, range, and
//! FTS operators take a `NOT ` prefix. Quantifiers wrap the parameter in
//! `ANY(...)` / `ALL(...)`.

pub mod relation;

use serde::Serialize;

use shared::config::CompilerLimits;
use shared::{QuerestError, Result};

use crate::ast::{
  Condition, Direction, Field, Filter, FilterOp, FilterValue, JsonStep, LogicOp, LogicTree,
  NullsOrder, OrderTerm, ParsedParams, SelectItem,
};
use crate::params::SqlParam;
use crate::parse;

/// A compiled statement: SQL text, positional parameters, referenced tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
  pub sql: String,
  pub params: Vec<SqlParam>,
  pub tables: Vec<String>,
}

/// A compiled WHERE body for subscription filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterClause {
  pub clause: String,
  pub params: Vec<SqlParam>,
}

/// Collects parameters in emission order and hands out `$n` placeholders.
#[derive(Debug, Default)]
pub(crate) struct ParamSink {
  params: Vec<SqlParam>,
}

impl ParamSink {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn bind(&mut self, value: SqlParam) -> String {
    self.params.push(value);
    format!("${}", self.params.len())
  }

  pub(crate) fn into_params(self) -> Vec<SqlParam> {
    self.params
  }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 2);
  out.push('"');
  for c in name.chars() {
    if c == '"' {
      out.push('"');
    }
    out.push(c);
  }
  out.push('"');
  out
}

/// Single-quote a string literal, doubling embedded quotes. Used only for
/// FTS language tags and JSON path keys, never for filter values.
pub(crate) fn quote_literal(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 2);
  out.push('\'');
  for c in s.chars() {
    if c == '\'' {
      out.push('\'');
    }
    out.push(c);
  }
  out.push('\'');
  out
}

/// Render a field expression: optionally qualified, JSON-pathed, and cast.
pub(crate) fn field_expr(field: &Field, qualifier: Option<&str>) -> String {
  let mut out = String::new();
  if let Some(q) = qualifier {
    out.push_str(&quote_ident(q));
    out.push('.');
  }
  out.push_str(&quote_ident(&field.name));
  for step in &field.json_path {
    match step {
      JsonStep::Arrow(key) => {
        out.push_str("->");
        out.push_str(&quote_literal(key));
      }
      JsonStep::DoubleArrow(key) => {
        out.push_str("->>");
        out.push_str(&quote_literal(key));
      }
      JsonStep::Index(i) => {
        out.push_str("->");
        out.push_str(&i.to_string());
      }
    }
  }
  if let Some(cast) = &field.cast {
    out.push_str("::");
    out.push_str(cast);
  }
  out
}

// ── Filter lowering ──────────────────────────────────────────────────

/// Render top-level conditions joined by ` AND `. Empty input renders "".
pub(crate) fn render_conditions(
  conditions: &[Condition],
  qualifier: Option<&str>,
  sink: &mut ParamSink,
) -> Result<String> {
  let mut parts = Vec::with_capacity(conditions.len());
  for c in conditions {
    parts.push(render_condition(c, qualifier, sink)?);
  }
  Ok(parts.join(" AND "))
}

fn render_condition(
  condition: &Condition,
  qualifier: Option<&str>,
  sink: &mut ParamSink,
) -> Result<String> {
  match condition {
    Condition::Filter(f) => render_filter(f, qualifier, sink),
    Condition::Group(t) => render_logic(t, qualifier, sink),
  }
}

fn render_logic(tree: &LogicTree, qualifier: Option<&str>, sink: &mut ParamSink) -> Result<String> {
  if tree.conditions.is_empty() {
    return Err(QuerestError::InvalidFilterFormat("()".to_string()));
  }
  let join = match tree.op {
    LogicOp::And => " AND ",
    LogicOp::Or => " OR ",
  };
  let mut parts = Vec::with_capacity(tree.conditions.len());
  for c in &tree.conditions {
    parts.push(render_condition(c, qualifier, sink)?);
  }
  let body = format!("({})", parts.join(join));
  Ok(if tree.negated {
    format!("NOT {body}")
  } else {
    body
  })
}

fn render_filter(f: &Filter, qualifier: Option<&str>, sink: &mut ParamSink) -> Result<String> {
  let lhs = field_expr(&f.field, qualifier);

  if f.op == FilterOp::Is {
    return render_is(f, &lhs);
  }

  if f.op.is_fts() {
    let payload = scalar_value(f)?;
    let placeholder = sink.bind(SqlParam::coerce(payload));
    let func = fts_function(f.op);
    let call = match &f.language {
      Some(lang) => format!("{func}({}, {placeholder})", quote_literal(lang)),
      None => format!("{func}({placeholder})"),
    };
    return Ok(negate_prefix(f.negated, format!("{lhs} @@ {call}")));
  }

  if let Some(q) = f.quantifier {
    let items = list_value(f)?;
    let placeholder = sink.bind(SqlParam::coerce_list(items));
    let sql = format!(
      "{lhs} {} {}({placeholder})",
      positive_symbol(f.op),
      q.keyword()
    );
    return Ok(negate_prefix(f.negated, sql));
  }

  match f.op {
    FilterOp::In => {
      let items = list_value(f)?;
      let placeholder = sink.bind(SqlParam::coerce_list(items));
      Ok(negate_prefix(
        f.negated,
        format!("{lhs} = ANY({placeholder})"),
      ))
    }
    FilterOp::Ov => {
      let items = list_value(f)?;
      let placeholder = sink.bind(SqlParam::coerce_list(items));
      Ok(negate_prefix(f.negated, format!("{lhs} && {placeholder}")))
    }
    op if algebraic_negation(op).is_some() => {
      let payload = scalar_value(f)?;
      let placeholder = sink.bind(SqlParam::coerce(payload));
      let sym = if f.negated {
        algebraic_negation(op).unwrap_or_else(|| positive_symbol(op))
      } else {
        positive_symbol(op)
      };
      Ok(format!("{lhs} {sym} {placeholder}"))
    }
    op => {
      // cs, cd, sl, sr, nxl, nxr, adj: prefix negation.
      let payload = scalar_value(f)?;
      let placeholder = sink.bind(SqlParam::coerce(payload));
      Ok(negate_prefix(
        f.negated,
        format!("{lhs} {} {placeholder}", positive_symbol(op)),
      ))
    }
  }
}

fn render_is(f: &Filter, lhs: &str) -> Result<String> {
  let payload = scalar_value(f)?;
  let form = match (payload, f.negated) {
    ("null", false) => "IS NULL",
    ("null", true) => "IS NOT NULL",
    ("not_null", false) => "IS NOT NULL",
    ("not_null", true) => "IS NULL",
    ("true", false) => "IS TRUE",
    ("true", true) => "IS NOT TRUE",
    ("false", false) => "IS FALSE",
    ("false", true) => "IS NOT FALSE",
    ("unknown", false) => "IS UNKNOWN",
    ("unknown", true) => "IS NOT UNKNOWN",
    _ => {
      return Err(QuerestError::InvalidFilterFormat(format!("is.{payload}")));
    }
  };
  Ok(format!("{lhs} {form}"))
}

fn scalar_value(f: &Filter) -> Result<&str> {
  match &f.value {
    FilterValue::Scalar(s) => Ok(s),
    FilterValue::List(_) => Err(QuerestError::InvalidFilterFormat(
      f.op.as_str().to_string(),
    )),
  }
}

fn list_value(f: &Filter) -> Result<&[String]> {
  match &f.value {
    FilterValue::List(items) => Ok(items),
    FilterValue::Scalar(_) => Err(QuerestError::ExpectedListFormat),
  }
}

fn negate_prefix(negated: bool, sql: String) -> String {
  if negated {
    format!("NOT {sql}")
  } else {
    sql
  }
}

fn positive_symbol(op: FilterOp) -> &'static str {
  match op {
    FilterOp::Eq => "=",
    FilterOp::Neq => "<>",
    FilterOp::Gt => ">",
    FilterOp::Gte => ">=",
    FilterOp::Lt => "<",
    FilterOp::Lte => "<=",
    FilterOp::Like => "LIKE",
    FilterOp::Ilike => "ILIKE",
    FilterOp::Match => "~",
    FilterOp::Imatch => "~*",
    FilterOp::In => "=",
    FilterOp::Cs => "@>",
    FilterOp::Cd => "<@",
    FilterOp::Ov => "&&",
    FilterOp::Sl => "<<",
    FilterOp::Sr => ">>",
    FilterOp::Nxl => "&<",
    FilterOp::Nxr => "&>",
    FilterOp::Adj => "-|-",
    FilterOp::Fts | FilterOp::Plfts | FilterOp::Phfts | FilterOp::Wfts | FilterOp::Is => {
      unreachable!("handled before symbol lookup")
    }
  }
}

/// Complementary operator for the comparison/pattern group, or `None` when
/// negation is a `NOT ` prefix instead.
fn algebraic_negation(op: FilterOp) -> Option<&'static str> {
  Some(match op {
    FilterOp::Eq => "<>",
    FilterOp::Neq => "=",
    FilterOp::Gt => "<=",
    FilterOp::Gte => "<",
    FilterOp::Lt => ">=",
    FilterOp::Lte => ">",
    FilterOp::Like => "NOT LIKE",
    FilterOp::Ilike => "NOT ILIKE",
    FilterOp::Match => "!~",
    FilterOp::Imatch => "!~*",
    _ => return None,
  })
}

fn fts_function(op: FilterOp) -> &'static str {
  match op {
    FilterOp::Fts => "to_tsquery",
    FilterOp::Plfts => "plainto_tsquery",
    FilterOp::Phfts => "phraseto_tsquery",
    FilterOp::Wfts => "websearch_to_tsquery",
    _ => unreachable!("not an FTS operator"),
  }
}

// ── Projection and order ─────────────────────────────────────────────

/// Render one field projection item, per the column emission rules.
pub(crate) fn render_projection_field(
  name: &str,
  alias: Option<&str>,
  json_path: &[JsonStep],
  cast: Option<&str>,
  qualifier: Option<&str>,
) -> String {
  if name == "*" && json_path.is_empty() && cast.is_none() {
    return match qualifier {
      Some(q) => format!("{}.*", quote_ident(q)),
      None => "*".to_string(),
    };
  }
  let f = Field {
    name: name.to_string(),
    json_path: json_path.to_vec(),
    cast: cast.map(str::to_string),
  };
  let mut sql = field_expr(&f, qualifier);
  if let Some(a) = alias {
    sql.push_str(" AS ");
    sql.push_str(&quote_ident(a));
  }
  sql
}

/// Render a projection list of plain fields. Embedded relations are the
/// relation builder's concern and are rejected here.
fn render_columns(select: Option<&[SelectItem]>) -> Result<String> {
  let items = match select {
    None => return Ok("*".to_string()),
    Some(items) if items.is_empty() => return Ok("*".to_string()),
    Some(items) => items,
  };
  let mut cols = Vec::with_capacity(items.len());
  for item in items {
    match item {
      SelectItem::Field {
        name,
        alias,
        json_path,
        cast,
      } => cols.push(render_projection_field(
        name,
        alias.as_deref(),
        json_path,
        cast.as_deref(),
        None,
      )),
      SelectItem::Relation { name, .. } | SelectItem::Spread { name, .. } => {
        return Err(QuerestError::RelationshipNotFound(name.clone()));
      }
    }
  }
  Ok(cols.join(", "))
}

pub(crate) fn render_order(terms: &[OrderTerm], qualifier: Option<&str>) -> String {
  terms
    .iter()
    .map(|t| {
      let mut s = field_expr(&t.field, qualifier);
      s.push_str(match t.direction {
        Direction::Asc => " ASC",
        Direction::Desc => " DESC",
      });
      match t.nulls {
        Some(NullsOrder::First) => s.push_str(" NULLS FIRST"),
        Some(NullsOrder::Last) => s.push_str(" NULLS LAST"),
        None => {}
      }
      s
    })
    .collect::<Vec<_>>()
    .join(", ")
}

pub(crate) fn append_pagination(
  sql: &mut String,
  params: &ParsedParams,
  sink: &mut ParamSink,
) -> Result<()> {
  if let Some(limit) = params.limit {
    let value = i64::try_from(limit).map_err(|_| QuerestError::InvalidLimit)?;
    let placeholder = sink.bind(SqlParam::Int(value));
    sql.push_str(" LIMIT ");
    sql.push_str(&placeholder);
  }
  if let Some(offset) = params.offset {
    let value = i64::try_from(offset).map_err(|_| QuerestError::InvalidOffset)?;
    let placeholder = sink.bind(SqlParam::Int(value));
    sql.push_str(" OFFSET ");
    sql.push_str(&placeholder);
  }
  Ok(())
}

// ── Entry points ─────────────────────────────────────────────────────

/// Lower a parsed request against a table, without relation embedding.
pub fn to_sql(table: &str, params: &ParsedParams) -> Result<SqlQuery> {
  let mut sink = ParamSink::new();
  let columns = render_columns(params.select.as_deref())?;
  let mut sql = format!("SELECT {columns} FROM {}", quote_ident(table));

  let where_body = render_conditions(&params.filters, None, &mut sink)?;
  if !where_body.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&where_body);
  }
  if !params.order.is_empty() {
    sql.push_str(" ORDER BY ");
    sql.push_str(&render_order(&params.order, None));
  }
  append_pagination(&mut sql, params, &mut sink)?;

  Ok(SqlQuery {
    sql,
    params: sink.into_params(),
    tables: vec![table.to_string()],
  })
}

/// Lower only a WHERE body from filter pairs, for subscription filters.
/// Reserved keys are skipped; an empty filter set yields an empty clause.
pub fn build_filter_clause(pairs: &[(String, String)]) -> Result<FilterClause> {
  let limits = CompilerLimits::default();
  let mut conditions = Vec::new();
  for (key, value) in pairs {
    if key.is_empty() {
      return Err(QuerestError::FieldNotAString);
    }
    if parse::is_reserved_key(key) {
      continue;
    }
    if let Some((op, negated)) = parse::logic::logic_key(key) {
      let tree = parse::logic::parse_logic_value(op, negated, value, 0, &limits)?;
      conditions.push(Condition::Group(tree));
    } else {
      conditions.push(Condition::Filter(parse::filter::parse_filter(key, value)?));
    }
  }
  let mut sink = ParamSink::new();
  let clause = render_conditions(&conditions, None, &mut sink)?;
  Ok(FilterClause {
    clause,
    params: sink.into_params(),
  })
}
