//! Universal safety properties of the compiler, checked over generated
//! inputs where generation adds coverage and deterministically otherwise.

#![cfg(test)]

use proptest::prelude::*;

use querest_core::{parse_pairs, parse_query_string, to_sql, SqlParam};
use querest_core::query_string_to_sql_with_relations;

use crate::fixtures::{seeded_cache, tenant};

// Generated values carry a `zq` marker that never occurs in the statement
// skeleton, so a value leaking into the SQL text is always detected.
proptest! {
  #[test]
  fn filter_values_never_reach_the_sql_text(raw in "[ -~]{1,40}") {
    let value = format!("zq{raw}");
    let pairs = vec![("name".to_string(), format!("eq.{value}"))];
    let params = parse_pairs(&pairs).unwrap();
    let q = to_sql("users", &params).unwrap();

    prop_assert!(!q.sql.contains(&value), "value leaked into sql: {}", q.sql);
    prop_assert_eq!(&q.params, &vec![SqlParam::Text(value)]);
  }

  #[test]
  fn list_items_never_reach_the_sql_text(a in "[a-zA-Z0-9 ';%_=()-]{0,20}", b in "[a-zA-Z0-9 ';%_=()-]{0,20}") {
    let (a, b) = (format!("zq{}", a.trim()), format!("zq{}", b.trim()));
    let pairs = vec![("name".to_string(), format!("in.({a},{b})"))];
    let params = parse_pairs(&pairs).unwrap();
    let q = to_sql("users", &params).unwrap();

    prop_assert!(!q.sql.contains(&a), "item leaked into sql: {}", q.sql);
    prop_assert!(!q.sql.contains(&b), "item leaked into sql: {}", q.sql);
    prop_assert_eq!(
      &q.params,
      &vec![SqlParam::List(vec![SqlParam::Text(a), SqlParam::Text(b)])]
    );
  }

  #[test]
  fn identifiers_with_quotes_are_doubled_and_wrapped(name in "[a-z\"]{1,12}") {
    let params = parse_query_string("id=eq.1").unwrap();
    let q = to_sql(&name, &params).unwrap();
    let quoted = format!("\"{}\"", name.replace('"', "\"\""));
    prop_assert!(
      q.sql.starts_with(&format!("SELECT * FROM {quoted}")),
      "bad quoting in: {}",
      q.sql
    );
  }

  #[test]
  fn parameters_follow_placeholder_order(n in 1usize..6) {
    let pairs: Vec<(String, String)> = (0..n)
      .map(|i| (format!("c{i}"), format!("eq.zqv{i}")))
      .collect();
    let params = parse_pairs(&pairs).unwrap();
    let q = to_sql("t", &params).unwrap();

    let mut prev = 0usize;
    for i in 0..n {
      let pos = q.sql.find(&format!("${}", i + 1)).unwrap();
      prop_assert!(pos > prev, "${} out of order in: {}", i + 1, q.sql);
      prev = pos;
      prop_assert_eq!(&q.params[i], &SqlParam::Text(format!("zqv{i}")));
    }
  }

  #[test]
  fn negated_comparisons_complement_the_positive_form(v in 0i64..1000) {
    for op in ["eq", "neq", "gt", "gte", "lt", "lte"] {
      let positive = to_sql(
        "t",
        &parse_pairs(&[("x".to_string(), format!("{op}.{v}"))]).unwrap(),
      )
      .unwrap();
      let negated = to_sql(
        "t",
        &parse_pairs(&[("x".to_string(), format!("not.{op}.{v}"))]).unwrap(),
      )
      .unwrap();
      prop_assert_ne!(&positive.sql, &negated.sql);
      prop_assert_eq!(&positive.params, &negated.params);
      prop_assert!(!negated.sql.contains("NOT"), "comparisons negate algebraically: {}", negated.sql);
    }
  }
}

#[test]
fn json_path_lowering_is_exact() {
  let q = to_sql(
    "t",
    &parse_pairs(&[("name->a->>b".to_string(), "eq.v".to_string())]).unwrap(),
  )
  .unwrap();
  assert!(q.sql.contains(r#""name"->'a'->>'b' = $1"#), "{}", q.sql);
}

#[test]
fn logic_tree_shape_is_preserved() {
  let q = to_sql(
    "t",
    &parse_pairs(&[(
      "and".to_string(),
      "(a.eq.1,or(b.eq.2,c.eq.3))".to_string(),
    )])
    .unwrap(),
  )
  .unwrap();
  assert!(
    q.sql.contains(r#"("a" = $1 AND ("b" = $2 OR "c" = $3))"#),
    "{}",
    q.sql
  );
}

#[test]
fn lateral_aliases_are_unique_within_a_query() {
  let cache = seeded_cache();
  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "customers",
    "select=id,orders(id,items(sku,qty))",
  )
  .unwrap();

  let aliases: Vec<&str> = ["orders_0", "items_1"]
    .into_iter()
    .filter(|a| q.sql.contains(*a))
    .collect();
  assert_eq!(aliases.len(), 2, "{}", q.sql);
  // Each agg alias appears exactly once in AS position.
  for agg in ["AS orders_0_agg", "AS items_1_agg"] {
    assert_eq!(q.sql.matches(agg).count(), 1, "{}", q.sql);
  }
}

#[test]
fn outer_alias_defaults_to_relation_name_and_respects_user_alias() {
  let cache = seeded_cache();
  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "customers",
    "select=orders(id)",
  )
  .unwrap();
  assert!(q.sql.contains(r#"AS "orders""#), "{}", q.sql);

  let q = query_string_to_sql_with_relations(
    &cache,
    &tenant(),
    "public",
    "customers",
    "select=history:orders(id)",
  )
  .unwrap();
  assert!(q.sql.contains(r#"AS "history""#), "{}", q.sql);
}
