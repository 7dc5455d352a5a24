//! Schema cache refresh: introspect, derive, swap.
//!
//! A refresh builds a complete `TenantSnapshot` off to the side and installs
//! it with one atomic swap, so readers see either the previous state or the
//! new one and never a mixture. Refreshes for the same tenant serialize on a
//! per-tenant mutex; refreshes for different tenants do not interfere. On
//! any failure (including the introspection timeout) the previously visible
//! snapshot is retained.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use shared::config::RefreshConfig;
use shared::schema::{Column, SchemaCache, Table, TenantSnapshot};
use shared::{QuerestError, TenantId};

use crate::connector::PgClient;

use super::cardinality::{derive_relationships, RawForeignKey, RawKey};

/// One column row from `information_schema.columns`.
#[derive(Debug, Clone)]
pub struct RawColumn {
  pub schema: String,
  pub table: String,
  pub name: String,
  pub type_name: String,
  pub is_nullable: bool,
  pub ordinal_position: i32,
}

/// Counts from a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
  pub tables: usize,
  pub relationships: usize,
}

/// Drives refreshes of a shared `SchemaCache`.
pub struct SchemaRefresher {
  cache: Arc<SchemaCache>,
  config: RefreshConfig,
  locks: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl SchemaRefresher {
  pub fn new(cache: Arc<SchemaCache>, config: RefreshConfig) -> Self {
    Self {
      cache,
      config,
      locks: DashMap::new(),
    }
  }

  pub fn cache(&self) -> &SchemaCache {
    &self.cache
  }

  /// Refresh one tenant from the given connection.
  pub async fn refresh(
    &self,
    tenant: &TenantId,
    client: &PgClient,
  ) -> Result<RefreshStats, QuerestError> {
    let lock = self
      .locks
      .entry(tenant.clone())
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone();
    let _guard = lock.lock().await;

    let timeout = Duration::from_secs(self.config.timeout_secs);
    let raw = match tokio::time::timeout(timeout, introspect(client, &self.config.schemas)).await
    {
      Err(_) => {
        warn!(
            tenant = %tenant,
            timeout_secs = self.config.timeout_secs,
            "schema refresh timed out; previous snapshot retained"
        );
        return Err(QuerestError::RefreshTimeout(self.config.timeout_secs));
      }
      Ok(Err(e)) => {
        warn!(tenant = %tenant, error = %e, "schema refresh failed; previous snapshot retained");
        return Err(QuerestError::RefreshFailed(e.into()));
      }
      Ok(Ok(raw)) => raw,
    };

    let snapshot = build_snapshot(raw);
    let stats = RefreshStats {
      tables: snapshot.table_count(),
      relationships: snapshot.relationship_count(),
    };
    self.cache.replace_tenant(tenant, snapshot);
    info!(
        tenant = %tenant,
        tables = stats.tables,
        relationships = stats.relationships,
        "schema refreshed"
    );
    Ok(stats)
  }

  /// Drop all cached metadata for a tenant.
  pub fn clear(&self, tenant: &TenantId) {
    self.cache.clear(tenant);
    self.locks.remove(tenant);
  }
}

/// Raw introspection output for one tenant.
pub(crate) struct RawSchema {
  pub columns: Vec<RawColumn>,
  pub keys: Vec<RawKey>,
  pub foreign_keys: Vec<RawForeignKey>,
}

async fn introspect(client: &PgClient, schemas: &[String]) -> anyhow::Result<RawSchema> {
  let columns = client.columns(schemas).await?;
  let keys = client.key_constraints(schemas).await?;
  let foreign_keys = client.foreign_keys(schemas).await?;
  Ok(RawSchema {
    columns,
    keys,
    foreign_keys,
  })
}

pub(crate) fn build_snapshot(raw: RawSchema) -> TenantSnapshot {
  let mut snapshot = TenantSnapshot::new();

  let mut grouped: BTreeMap<(String, String), Vec<Column>> = BTreeMap::new();
  for col in raw.columns {
    let is_primary_key = raw.keys.iter().any(|k| {
      k.is_primary && k.schema == col.schema && k.table == col.table && k.columns.contains(&col.name)
    });
    grouped
      .entry((col.schema, col.table))
      .or_default()
      .push(Column {
        name: col.name,
        type_name: col.type_name,
        is_nullable: col.is_nullable,
        is_primary_key,
        ordinal_position: col.ordinal_position,
      });
  }
  for ((schema, name), columns) in grouped {
    snapshot.insert_table(Table {
      schema,
      name,
      columns,
    });
  }

  for rel in derive_relationships(&raw.foreign_keys, &raw.keys) {
    snapshot.insert_relationship(rel);
  }
  snapshot
}
