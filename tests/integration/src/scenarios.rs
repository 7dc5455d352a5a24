//! The canonical end-to-end request scenarios, compiled through the public
//! API against the seeded cache.

#![cfg(test)]

use querest_core::{
  query_string_to_sql, query_string_to_sql_with_relations, SqlParam,
};

use crate::fixtures::{seeded_cache, tenant};

#[test]
fn basic_filter_with_parameter_coercion() {
  let q = query_string_to_sql("users", "id=eq.1").unwrap();
  assert!(q.sql.contains(r#"WHERE "id" = $1"#), "{}", q.sql);
  assert_eq!(q.params, vec![SqlParam::Int(1)]);
}

#[test]
fn quantified_comparison_with_array_parameter() {
  let q = query_string_to_sql("items", "id=eq(any).{1,2,3}").unwrap();
  assert!(q.sql.contains(r#""id" = ANY($1)"#), "{}", q.sql);
  assert_eq!(
    q.params,
    vec![SqlParam::List(vec![
      SqlParam::Int(1),
      SqlParam::Int(2),
      SqlParam::Int(3),
    ])]
  );
}

#[test]
fn null_test_with_negation() {
  let q = query_string_to_sql("users", "deleted_at=not.is.not_null").unwrap();
  assert!(q.sql.contains(r#""deleted_at" IS NULL"#), "{}", q.sql);
  assert!(q.params.is_empty());
}

#[test]
fn json_path_equality() {
  let q = query_string_to_sql("items", "data->>name=eq.test").unwrap();
  assert!(q.sql.contains(r#""data"->>'name' = $1"#), "{}", q.sql);
  assert_eq!(q.params, vec![SqlParam::Text("test".to_string())]);
}

#[test]
fn nested_logic_tree() {
  let q = query_string_to_sql(
    "products",
    "and=(category.eq.Electronics,or(price.lt.100,stock.gt.100))",
  )
  .unwrap();
  assert!(
    q.sql
      .contains(r#"("category" = $1 AND ("price" < $2 OR "stock" > $3))"#),
    "{}",
    q.sql
  );
  assert_eq!(
    q.params,
    vec![
      SqlParam::Text("Electronics".to_string()),
      SqlParam::Int(100),
      SqlParam::Int(100),
    ]
  );
}

#[test]
fn embedded_one_to_many_relation() {
  let cache = seeded_cache();
  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "customers",
    "select=id,name,orders(id,status,total_amount)",
  )
  .unwrap();

  assert!(q.sql.contains("LEFT JOIN LATERAL"), "{}", q.sql);
  assert!(q.sql.contains("json_agg("), "{}", q.sql);
  assert!(q.sql.contains(r#""public"."orders""#), "{}", q.sql);
  assert!(
    q.sql.contains(r#""customers"."id" = "orders_0"."customer_id""#),
    "{}",
    q.sql
  );
  assert!(
    q.sql.contains(r#"orders_0_agg.orders_0 AS "orders""#),
    "{}",
    q.sql
  );
}

#[test]
fn many_to_many_with_junction() {
  let cache = seeded_cache();
  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "posts",
    "select=id,title,tags(id,name)",
  )
  .unwrap();

  assert!(
    q.sql.contains(r#""public"."post_tags" AS junction_0"#),
    "{}",
    q.sql
  );
  assert!(
    q.sql
      .contains(r#"JOIN "public"."tags" AS tags_0 ON "junction_0"."tag_id" = "tags_0"."id""#),
    "{}",
    q.sql
  );
  assert!(
    q.sql.contains(r#"WHERE "posts"."id" = "junction_0"."post_id""#),
    "{}",
    q.sql
  );
}

#[test]
fn injection_attempt_is_parameterized() {
  let q = query_string_to_sql("users", "name=eq.%27%3B%20DROP%20TABLE%20users%3B--").unwrap();
  assert!(!q.sql.contains("DROP TABLE"), "{}", q.sql);
  assert_eq!(
    q.params,
    vec![SqlParam::Text("'; DROP TABLE users;--".to_string())]
  );
}

#[test]
fn tables_list_names_every_touched_relation() {
  let cache = seeded_cache();
  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "posts",
    "select=id,tags(id)",
  )
  .unwrap();
  assert_eq!(
    q.tables,
    vec![
      "posts".to_string(),
      "tags".to_string(),
      "post_tags".to_string(),
    ]
  );
}
