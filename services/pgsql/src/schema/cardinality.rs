//! Relationship cardinality derivation from raw catalog rows.
//!
//! Pure functions over introspection output:
//!
//! 1. every foreign key yields an `m2o` relationship, downgraded to `o2o`
//!    when the FK's columns are a subset of a primary/unique key on the
//!    source table;
//! 2. every such relationship is mirrored as `o2m` (or `o2o`);
//! 3. a table with two foreign keys whose combined columns cover one of its
//!    primary/unique keys is a junction: each FK pair yields an `m2m`
//!    relationship in each direction, carrying the junction descriptor.

use std::collections::HashMap;

use shared::schema::{Cardinality, Junction, Relationship};

/// A primary or unique key constraint, as introspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKey {
  pub schema: String,
  pub table: String,
  pub columns: Vec<String>,
  pub is_primary: bool,
}

/// A foreign key constraint, as introspected. Source and target column
/// lists are paired by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKey {
  pub constraint: String,
  pub source_schema: String,
  pub source_table: String,
  pub source_columns: Vec<String>,
  pub target_schema: String,
  pub target_table: String,
  pub target_columns: Vec<String>,
}

/// Derive the full relationship set for a tenant.
pub fn derive_relationships(fks: &[RawForeignKey], keys: &[RawKey]) -> Vec<Relationship> {
  let mut rels = Vec::new();

  for fk in fks {
    let unique_source = fk_is_unique(fk, keys);
    let forward = if unique_source {
      Cardinality::O2o
    } else {
      Cardinality::M2o
    };
    let mirror = if unique_source {
      Cardinality::O2o
    } else {
      Cardinality::O2m
    };

    rels.push(Relationship {
      constraint: fk.constraint.clone(),
      source_schema: fk.source_schema.clone(),
      source_table: fk.source_table.clone(),
      source_columns: fk.source_columns.clone(),
      target_schema: fk.target_schema.clone(),
      target_table: fk.target_table.clone(),
      target_columns: fk.target_columns.clone(),
      cardinality: forward,
      junction: None,
    });
    rels.push(Relationship {
      constraint: fk.constraint.clone(),
      source_schema: fk.target_schema.clone(),
      source_table: fk.target_table.clone(),
      source_columns: fk.target_columns.clone(),
      target_schema: fk.source_schema.clone(),
      target_table: fk.source_table.clone(),
      target_columns: fk.source_columns.clone(),
      cardinality: mirror,
      junction: None,
    });
  }

  // Junction detection: group FKs by their source table.
  let mut by_table: HashMap<(&str, &str), Vec<&RawForeignKey>> = HashMap::new();
  for fk in fks {
    by_table
      .entry((fk.source_schema.as_str(), fk.source_table.as_str()))
      .or_default()
      .push(fk);
  }

  for ((schema, table), table_fks) in &by_table {
    if table_fks.len() < 2 {
      continue;
    }
    for near in table_fks {
      for far in table_fks {
        if near.constraint == far.constraint {
          continue;
        }
        let mut combined: Vec<&str> = near.source_columns.iter().map(String::as_str).collect();
        combined.extend(far.source_columns.iter().map(String::as_str));
        if !covers_some_key(keys, schema, table, &combined) {
          continue;
        }
        rels.push(Relationship {
          // The far-side FK is what users disambiguate with.
          constraint: far.constraint.clone(),
          source_schema: near.target_schema.clone(),
          source_table: near.target_table.clone(),
          source_columns: near.target_columns.clone(),
          target_schema: far.target_schema.clone(),
          target_table: far.target_table.clone(),
          target_columns: far.target_columns.clone(),
          cardinality: Cardinality::M2m,
          junction: Some(Junction {
            schema: (*schema).to_string(),
            table: (*table).to_string(),
            source_columns: near.source_columns.clone(),
            target_columns: far.source_columns.clone(),
            source_constraint: near.constraint.clone(),
            target_constraint: far.constraint.clone(),
          }),
        });
      }
    }
  }

  rels
}

/// True when the FK's source columns are a subset of some primary or unique
/// key on the source table.
fn fk_is_unique(fk: &RawForeignKey, keys: &[RawKey]) -> bool {
  keys.iter().any(|k| {
    k.schema == fk.source_schema
      && k.table == fk.source_table
      && fk
        .source_columns
        .iter()
        .all(|c| k.columns.contains(c))
  })
}

/// True when some primary/unique key of the table is contained in `columns`.
fn covers_some_key(keys: &[RawKey], schema: &str, table: &str, columns: &[&str]) -> bool {
  keys.iter().any(|k| {
    k.schema == schema
      && k.table == table
      && k.columns.iter().all(|c| columns.contains(&c.as_str()))
  })
}
