//! Relation embedding: `LEFT JOIN LATERAL` subqueries resolved against the
//! schema cache.
//!
//! Every embedded relation becomes one lateral join with a two-level body:
//! the inner query applies the child projection, the join condition, and
//! (for to-one cardinalities) `LIMIT 1`; the outer level aggregates the row
//! set to JSON with `row_to_json` or `json_agg`. A spread skips the
//! aggregation level and its children surface as real columns of the parent
//! row.
//!
//! Synthetic aliases are `<name>_<depth>` with depth increasing across the
//! whole query, so nested embeds never collide.

use shared::schema::{Cardinality, Relationship, SchemaCache, TenantSnapshot};
use shared::{Result, TenantId};

use crate::ast::{ParsedParams, SelectItem};

use super::{
  append_pagination, quote_ident, render_conditions, render_order, render_projection_field,
  ParamSink, SqlQuery,
};

/// Hints that pick a join kind instead of naming a relationship.
const JOIN_KIND_HINTS: &[&str] = &["inner", "left"];

/// Lower a parsed request against a table, embedding relations through the
/// given cache. Relationship lookups resolve against one snapshot for the
/// whole request, so a concurrent refresh can never produce a torn query.
pub fn to_sql_with_relations(
  cache: &SchemaCache,
  tenant: &TenantId,
  schema: &str,
  table: &str,
  params: &ParsedParams,
) -> Result<SqlQuery> {
  let snapshot = cache.snapshot(tenant).unwrap_or_default();
  let mut builder = RelationBuilder::new(&snapshot, table);

  let mut columns: Vec<String> = Vec::new();
  let mut joins = String::new();
  match params.select.as_deref() {
    None | Some([]) => columns.push("*".to_string()),
    Some(items) => {
      for item in items {
        match item {
          SelectItem::Field {
            name,
            alias,
            json_path,
            cast,
          } => columns.push(render_projection_field(
            name,
            alias.as_deref(),
            json_path,
            cast.as_deref(),
            None,
          )),
          SelectItem::Relation {
            name,
            alias,
            hint,
            children,
          } => {
            let embed = builder.build_embed(
              name,
              alias.as_deref(),
              hint.as_deref(),
              children,
              false,
              schema,
              table,
              table,
            )?;
            joins.push(' ');
            joins.push_str(&embed.join_sql);
            columns.extend(embed.outer_cols);
          }
          SelectItem::Spread {
            name,
            alias,
            hint,
            children,
          } => {
            let embed = builder.build_embed(
              name,
              alias.as_deref(),
              hint.as_deref(),
              children,
              true,
              schema,
              table,
              table,
            )?;
            joins.push(' ');
            joins.push_str(&embed.join_sql);
            columns.extend(embed.outer_cols);
          }
        }
      }
    }
  }

  let mut sink = ParamSink::new();
  let mut sql = format!("SELECT {} FROM {}", columns.join(", "), quote_ident(table));
  sql.push_str(&joins);

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
    tables: builder.into_tables(),
  })
}

struct RelationBuilder<'a> {
  snapshot: &'a TenantSnapshot,
  depth: usize,
  tables: Vec<String>,
}

struct Embed {
  join_sql: String,
  outer_cols: Vec<String>,
}

impl<'a> RelationBuilder<'a> {
  fn new(snapshot: &'a TenantSnapshot, root_table: &str) -> Self {
    Self {
      snapshot,
      depth: 0,
      tables: vec![root_table.to_string()],
    }
  }

  fn into_tables(self) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(self.tables.len());
    for t in self.tables {
      if !out.contains(&t) {
        out.push(t);
      }
    }
    out
  }

  fn resolve(
    &self,
    parent_schema: &str,
    parent_table: &str,
    name: &str,
    hint: Option<&str>,
  ) -> Result<Relationship> {
    match hint {
      Some(h) if !JOIN_KIND_HINTS.contains(&h) => self
        .snapshot
        .find_relationship_with_hint(parent_schema, parent_table, name, h)
        .cloned(),
      _ => self
        .snapshot
        .find_relationship(parent_schema, parent_table, name)
        .cloned(),
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn build_embed(
    &mut self,
    name: &str,
    user_alias: Option<&str>,
    hint: Option<&str>,
    children: &[SelectItem],
    spread: bool,
    parent_schema: &str,
    parent_table: &str,
    parent_qualifier: &str,
  ) -> Result<Embed> {
    let rel = self.resolve(parent_schema, parent_table, name, hint)?;
    let depth = self.depth;
    self.depth += 1;

    let alias = format!("{}_{depth}", sanitize_alias(name));
    let agg = format!("{alias}_agg");
    self.tables.push(rel.target_table.clone());

    // Inner projection plus nested lateral joins.
    let mut projection: Vec<String> = Vec::new();
    let mut out_names: Vec<String> = Vec::new();
    let mut nested_joins = String::new();
    for child in children {
      match child {
        SelectItem::Field {
          name: cname,
          alias: calias,
          json_path,
          cast,
        } => {
          let out = calias.clone().unwrap_or_else(|| cname.clone());
          // JSON-pathed and cast columns need an explicit output name.
          let needs_alias = cname != "*"
            && (calias.is_some() || !json_path.is_empty() || cast.is_some());
          projection.push(render_projection_field(
            cname,
            needs_alias.then_some(out.as_str()),
            json_path,
            cast.as_deref(),
            Some(&alias),
          ));
          out_names.push(out);
        }
        SelectItem::Relation {
          name: cname,
          alias: calias,
          hint: chint,
          children: cchildren,
        } => {
          let embed = self.build_embed(
            cname,
            calias.as_deref(),
            chint.as_deref(),
            cchildren,
            false,
            &rel.target_schema,
            &rel.target_table,
            &alias,
          )?;
          nested_joins.push(' ');
          nested_joins.push_str(&embed.join_sql);
          out_names.push(calias.clone().unwrap_or_else(|| cname.clone()));
          projection.extend(embed.outer_cols);
        }
        SelectItem::Spread {
          name: cname,
          alias: calias,
          hint: chint,
          children: cchildren,
        } => {
          let embed = self.build_embed(
            cname,
            calias.as_deref(),
            chint.as_deref(),
            cchildren,
            true,
            &rel.target_schema,
            &rel.target_table,
            &alias,
          )?;
          nested_joins.push(' ');
          nested_joins.push_str(&embed.join_sql);
          projection.extend(embed.outer_cols);
          out_names.extend(spread_out_names(cchildren));
        }
      }
    }

    let target_from = format!(
      "{}.{}",
      quote_ident(&rel.target_schema),
      quote_ident(&rel.target_table)
    );
    let (from_clause, join_filter) = match (&rel.cardinality, &rel.junction) {
      (Cardinality::M2m, Some(junction)) => {
        let jalias = format!("junction_{depth}");
        let on = equality_pairs(&jalias, &junction.target_columns, &alias, &rel.target_columns);
        let from = format!(
          "{}.{} AS {jalias} JOIN {target_from} AS {alias} ON {on}",
          quote_ident(&junction.schema),
          quote_ident(&junction.table)
        );
        let filter = equality_pairs(
          parent_qualifier,
          &rel.source_columns,
          &jalias,
          &junction.source_columns,
        );
        self.tables.push(junction.table.clone());
        (from, filter)
      }
      _ => {
        let from = format!("{target_from} AS {alias}");
        let filter = equality_pairs(
          parent_qualifier,
          &rel.source_columns,
          &alias,
          &rel.target_columns,
        );
        (from, filter)
      }
    };

    let projection_sql = if projection.is_empty() {
      format!("{alias}.*")
    } else {
      projection.join(", ")
    };
    let mut inner = format!("SELECT {projection_sql} FROM {from_clause}");
    inner.push_str(&nested_joins);
    inner.push_str(" WHERE ");
    inner.push_str(&join_filter);
    if matches!(rel.cardinality, Cardinality::M2o | Cardinality::O2o) {
      inner.push_str(" LIMIT 1");
    }

    if spread {
      let join_sql = format!("LEFT JOIN LATERAL ({inner}) AS {agg} ON true");
      let outer_cols = if out_names.is_empty() {
        vec![format!("{agg}.*")]
      } else {
        out_names
          .iter()
          .map(|n| {
            if n == "*" {
              format!("{agg}.*")
            } else {
              format!("{agg}.{} AS {}", quote_ident(n), quote_ident(n))
            }
          })
          .collect()
      };
      return Ok(Embed {
        join_sql,
        outer_cols,
      });
    }

    let agg_fn = match rel.cardinality {
      Cardinality::M2o | Cardinality::O2o => "row_to_json",
      Cardinality::O2m | Cardinality::M2m => "json_agg",
    };
    let join_sql = format!(
      "LEFT JOIN LATERAL (SELECT {agg_fn}({alias}) AS {alias} FROM ({inner}) AS {alias}) \
       AS {agg} ON true"
    );
    let output = user_alias.unwrap_or(name);
    let outer_cols = vec![format!("{agg}.{alias} AS {}", quote_ident(output))];
    Ok(Embed {
      join_sql,
      outer_cols,
    })
  }
}

/// Output column names a spread item contributes to its parent.
fn spread_out_names(children: &[SelectItem]) -> Vec<String> {
  let mut names = Vec::new();
  for child in children {
    match child {
      SelectItem::Field { name, alias, .. } | SelectItem::Relation { name, alias, .. } => {
        names.push(alias.clone().unwrap_or_else(|| name.clone()));
      }
      SelectItem::Spread { children, .. } => names.extend(spread_out_names(children)),
    }
  }
  names
}

/// Pair columns by position into AND-joined equalities.
fn equality_pairs(
  left_alias: &str,
  left_cols: &[String],
  right_alias: &str,
  right_cols: &[String],
) -> String {
  left_cols
    .iter()
    .zip(right_cols.iter())
    .map(|(l, r)| {
      format!(
        "{}.{} = {}.{}",
        quote_ident(left_alias),
        quote_ident(l),
        quote_ident(right_alias),
        quote_ident(r)
      )
    })
    .collect::<Vec<_>>()
    .join(" AND ")
}

/// Synthetic aliases appear unquoted in `AS` position; restrict them to the
/// identifier alphabet.
fn sanitize_alias(name: &str) -> String {
  name
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' {
        c
      } else {
        '_'
      }
    })
    .collect()
}
