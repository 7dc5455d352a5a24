//! Schema cache concurrency: whole-tenant snapshot atomicity under
//! concurrent readers, and tenant isolation.

#![cfg(test)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shared::schema::{Cardinality, Relationship, SchemaCache, TenantSnapshot};
use shared::TenantId;

const RELS_PER_GENERATION: usize = 5;

fn generation_snapshot(generation: usize) -> TenantSnapshot {
  let mut snapshot = TenantSnapshot::new();
  for i in 0..RELS_PER_GENERATION {
    snapshot.insert_relationship(Relationship {
      constraint: format!("gen{generation}_fk{i}"),
      source_schema: "public".to_string(),
      source_table: "root".to_string(),
      source_columns: vec!["id".to_string()],
      target_schema: "public".to_string(),
      target_table: format!("child{i}"),
      target_columns: vec!["root_id".to_string()],
      cardinality: Cardinality::O2m,
      junction: None,
    });
  }
  snapshot
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_a_torn_snapshot() {
  let cache = Arc::new(SchemaCache::new());
  let tenant = TenantId::new("acme");
  cache.replace_tenant(&tenant, generation_snapshot(0));

  let stop = Arc::new(AtomicBool::new(false));
  let readers: Vec<_> = (0..3)
    .map(|_| {
      let cache = Arc::clone(&cache);
      let tenant = tenant.clone();
      let stop = Arc::clone(&stop);
      tokio::spawn(async move {
        while !stop.load(Ordering::Relaxed) {
          let snapshot = cache.snapshot(&tenant).expect("snapshot always present");
          let rels = snapshot.relationships("public", "root");
          assert_eq!(rels.len(), RELS_PER_GENERATION);
          let generation = rels[0]
            .constraint
            .split('_')
            .next()
            .unwrap()
            .to_string();
          for r in rels {
            assert!(
              r.constraint.starts_with(&generation),
              "torn snapshot: {} vs {}",
              r.constraint,
              generation
            );
          }
          tokio::task::yield_now().await;
        }
      })
    })
    .collect();

  for generation in 1..200 {
    cache.replace_tenant(&tenant, generation_snapshot(generation));
    if generation % 20 == 0 {
      tokio::task::yield_now().await;
    }
  }

  stop.store(true, Ordering::Relaxed);
  for reader in readers {
    reader.await.expect("reader panicked");
  }
}

#[test]
fn tenants_are_isolated() {
  let cache = SchemaCache::new();
  let acme = TenantId::new("acme");
  let globex = TenantId::new("globex");

  cache.replace_tenant(&acme, generation_snapshot(1));
  cache.replace_tenant(&globex, generation_snapshot(2));

  cache.clear(&acme);
  assert!(cache.snapshot(&acme).is_none());
  let kept = cache.snapshot(&globex).expect("other tenant untouched");
  assert_eq!(
    kept.relationships("public", "root").len(),
    RELS_PER_GENERATION
  );

  cache.clear_all();
  assert!(cache.snapshot(&globex).is_none());
}
