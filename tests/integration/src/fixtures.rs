//! A small commerce schema, built the way a real refresh builds it: raw
//! catalog rows run through cardinality derivation, then published to the
//! cache as one tenant snapshot.

use querest_pgsql::{derive_relationships, RawForeignKey, RawKey};
use shared::schema::{SchemaCache, TenantSnapshot};
use shared::TenantId;

pub fn tenant() -> TenantId {
  TenantId::default_tenant()
}

fn fk(
  constraint: &str,
  source: &str,
  source_cols: &[&str],
  target: &str,
  target_cols: &[&str],
) -> RawForeignKey {
  RawForeignKey {
    constraint: constraint.to_string(),
    source_schema: "public".to_string(),
    source_table: source.to_string(),
    source_columns: source_cols.iter().map(|c| c.to_string()).collect(),
    target_schema: "public".to_string(),
    target_table: target.to_string(),
    target_columns: target_cols.iter().map(|c| c.to_string()).collect(),
  }
}

fn pk(table: &str, cols: &[&str]) -> RawKey {
  RawKey {
    schema: "public".to_string(),
    table: table.to_string(),
    columns: cols.iter().map(|c| c.to_string()).collect(),
    is_primary: true,
  }
}

/// customers ⇐ orders ⇐ items, posts ⇔ tags (via post_tags).
pub fn seeded_cache() -> SchemaCache {
  let fks = vec![
    fk(
      "orders_customer_id_fkey",
      "orders",
      &["customer_id"],
      "customers",
      &["id"],
    ),
    fk(
      "items_order_id_fkey",
      "items",
      &["order_id"],
      "orders",
      &["id"],
    ),
    fk(
      "post_tags_post_id_fkey",
      "post_tags",
      &["post_id"],
      "posts",
      &["id"],
    ),
    fk(
      "post_tags_tag_id_fkey",
      "post_tags",
      &["tag_id"],
      "tags",
      &["id"],
    ),
  ];
  let keys = vec![
    pk("customers", &["id"]),
    pk("orders", &["id"]),
    pk("items", &["id"]),
    pk("posts", &["id"]),
    pk("tags", &["id"]),
    pk("post_tags", &["post_id", "tag_id"]),
  ];

  let mut snapshot = TenantSnapshot::new();
  for rel in derive_relationships(&fks, &keys) {
    snapshot.insert_relationship(rel);
  }

  let cache = SchemaCache::new();
  cache.replace_tenant(&tenant(), snapshot);
  cache
}
