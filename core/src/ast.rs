//! AST shared by the four sublanguage parsers and the SQL emitter.
//!
//! Every parser produces values from this closed set. Nodes are immutable
//! once built: a `ParsedParams` is constructed exactly once per request and
//! then consumed by the emitter.

use serde::{Deserialize, Serialize};

/// One step in a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonStep {
  /// `->key` — descend into an object, yielding JSON.
  Arrow(String),
  /// `->>key` — descend into an object, yielding text.
  DoubleArrow(String),
  /// `->n` — integer array index.
  Index(i64),
}

/// A column reference: base name, optional JSON path, optional cast.
///
/// The name is preserved verbatim, including characters outside the strict
/// identifier alphabet (a dotted `schema.table.column` stays one name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
  pub name: String,
  pub json_path: Vec<JsonStep>,
  pub cast: Option<String>,
}

impl Field {
  pub fn plain(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      json_path: Vec::new(),
      cast: None,
    }
  }
}

/// The closed set of twenty-two filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
  Eq,
  Neq,
  Gt,
  Gte,
  Lt,
  Lte,
  Like,
  Ilike,
  Match,
  Imatch,
  In,
  Cs,
  Cd,
  Ov,
  Fts,
  Plfts,
  Phfts,
  Wfts,
  Sl,
  Sr,
  Nxl,
  Nxr,
  Adj,
  Is,
}

impl FilterOp {
  /// Parse an operator token, or `None` for anything outside the set.
  pub fn parse(s: &str) -> Option<Self> {
    Some(match s {
      "eq" => Self::Eq,
      "neq" => Self::Neq,
      "gt" => Self::Gt,
      "gte" => Self::Gte,
      "lt" => Self::Lt,
      "lte" => Self::Lte,
      "like" => Self::Like,
      "ilike" => Self::Ilike,
      "match" => Self::Match,
      "imatch" => Self::Imatch,
      "in" => Self::In,
      "cs" => Self::Cs,
      "cd" => Self::Cd,
      "ov" => Self::Ov,
      "fts" => Self::Fts,
      "plfts" => Self::Plfts,
      "phfts" => Self::Phfts,
      "wfts" => Self::Wfts,
      "sl" => Self::Sl,
      "sr" => Self::Sr,
      "nxl" => Self::Nxl,
      "nxr" => Self::Nxr,
      "adj" => Self::Adj,
      "is" => Self::Is,
      _ => return None,
    })
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Eq => "eq",
      Self::Neq => "neq",
      Self::Gt => "gt",
      Self::Gte => "gte",
      Self::Lt => "lt",
      Self::Lte => "lte",
      Self::Like => "like",
      Self::Ilike => "ilike",
      Self::Match => "match",
      Self::Imatch => "imatch",
      Self::In => "in",
      Self::Cs => "cs",
      Self::Cd => "cd",
      Self::Ov => "ov",
      Self::Fts => "fts",
      Self::Plfts => "plfts",
      Self::Phfts => "phfts",
      Self::Wfts => "wfts",
      Self::Sl => "sl",
      Self::Sr => "sr",
      Self::Nxl => "nxl",
      Self::Nxr => "nxr",
      Self::Adj => "adj",
      Self::Is => "is",
    }
  }

  /// Comparison and pattern operators accept `(any)` / `(all)`.
  pub fn supports_quantifier(self) -> bool {
    matches!(
      self,
      Self::Eq
        | Self::Neq
        | Self::Gt
        | Self::Gte
        | Self::Lt
        | Self::Lte
        | Self::Like
        | Self::Ilike
        | Self::Match
        | Self::Imatch
    )
  }

  /// Full-text search operators accept a language modifier.
  pub fn is_fts(self) -> bool {
    matches!(self, Self::Fts | Self::Plfts | Self::Phfts | Self::Wfts)
  }

  /// Operators whose payload is a parenthesized list.
  pub fn takes_list(self) -> bool {
    matches!(self, Self::In | Self::Ov)
  }
}

/// Quantifier modifier on a comparison or pattern operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
  Any,
  All,
}

impl Quantifier {
  pub fn keyword(self) -> &'static str {
    match self {
      Self::Any => "ANY",
      Self::All => "ALL",
    }
  }
}

/// The right-hand side of a filter: a scalar or a flat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
  Scalar(String),
  List(Vec<String>),
}

/// One comparison against one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
  pub field: Field,
  pub op: FilterOp,
  pub quantifier: Option<Quantifier>,
  /// Full-text search language, only on FTS operators.
  pub language: Option<String>,
  pub negated: bool,
  pub value: FilterValue,
}

/// Boolean combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOp {
  And,
  Or,
}

/// A boolean combinator over filters and nested combinators.
///
/// Negation is recorded on the tree itself, never pushed down into the
/// children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicTree {
  pub op: LogicOp,
  pub negated: bool,
  pub conditions: Vec<Condition>,
}

/// A leaf filter or a nested combinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
  Filter(Filter),
  Group(LogicTree),
}

/// One projection item in a select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectItem {
  /// A column projection, possibly JSON-pathed and/or cast.
  Field {
    name: String,
    alias: Option<String>,
    json_path: Vec<JsonStep>,
    cast: Option<String>,
  },
  /// An embedded relation, nested as a JSON column in the parent row.
  Relation {
    name: String,
    alias: Option<String>,
    hint: Option<String>,
    children: Vec<SelectItem>,
  },
  /// `...relation(cols)` — the relation's columns inlined into the parent.
  Spread {
    name: String,
    alias: Option<String>,
    hint: Option<String>,
    children: Vec<SelectItem>,
  },
}

impl SelectItem {
  /// True for relation and spread items.
  pub fn is_embedded(&self) -> bool {
    matches!(self, Self::Relation { .. } | Self::Spread { .. })
  }
}

/// Sort direction; ascending when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Asc,
  Desc,
}

/// Explicit nulls placement on an order term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
  First,
  Last,
}

/// One term of an `order` expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTerm {
  pub field: Field,
  pub direction: Direction,
  pub nulls: Option<NullsOrder>,
}

/// The root AST for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedParams {
  /// Projection; `None` means `*`.
  pub select: Option<Vec<SelectItem>>,
  /// Top-level filters and logic groups, in query-string order.
  pub filters: Vec<Condition>,
  pub order: Vec<OrderTerm>,
  pub limit: Option<u64>,
  pub offset: Option<u64>,
}
