use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::QuerestError;
use crate::tenant::TenantId;

use super::types::{Relationship, Table};

/// All schema metadata visible for one tenant at one point in time.
///
/// A snapshot is immutable once published. Readers that need a consistent
/// view across several lookups (the relation builder resolves one lookup per
/// embedded relation) hold the `Arc` for the duration of the request.
#[derive(Debug, Default)]
pub struct TenantSnapshot {
    tables: HashMap<(String, String), Table>,
    relationships: HashMap<(String, String), Vec<Relationship>>,
}

impl TenantSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, keyed by `(schema, name)`.
    pub fn insert_table(&mut self, table: Table) {
        self.tables
            .insert((table.schema.clone(), table.name.clone()), table);
    }

    /// Register a relationship under its source table.
    pub fn insert_relationship(&mut self, rel: Relationship) {
        self.relationships
            .entry((rel.source_schema.clone(), rel.source_table.clone()))
            .or_default()
            .push(rel);
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.values().map(Vec::len).sum()
    }

    pub fn get_table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.tables.get(&(schema.to_string(), table.to_string()))
    }

    pub fn relationships(&self, schema: &str, table: &str) -> &[Relationship] {
        self.relationships
            .get(&(schema.to_string(), table.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find the relationship from `source` to `target`.
    ///
    /// Zero candidates is not-found; two or more is ambiguous and the caller
    /// must supply a hint.
    pub fn find_relationship(
        &self,
        schema: &str,
        source: &str,
        target: &str,
    ) -> Result<&Relationship, QuerestError> {
        let candidates: Vec<&Relationship> = self
            .relationships(schema, source)
            .iter()
            .filter(|r| r.target_table == target)
            .collect();
        match candidates.as_slice() {
            [] => Err(QuerestError::RelationshipNotFound(target.to_string())),
            [one] => Ok(one),
            _ => Err(QuerestError::RelationshipAmbiguous(target.to_string())),
        }
    }

    /// Find the relationship from `source` to `target`, narrowed by `hint`
    /// (a constraint name or a join column on either side).
    pub fn find_relationship_with_hint(
        &self,
        schema: &str,
        source: &str,
        target: &str,
        hint: &str,
    ) -> Result<&Relationship, QuerestError> {
        let candidates: Vec<&Relationship> = self
            .relationships(schema, source)
            .iter()
            .filter(|r| r.target_table == target && r.matches_hint(hint))
            .collect();
        match candidates.as_slice() {
            [] => Err(QuerestError::RelationshipNotFound(target.to_string())),
            [one] => Ok(one),
            _ => Err(QuerestError::RelationshipAmbiguous(target.to_string())),
        }
    }
}

/// Process-wide schema metadata, keyed by tenant.
///
/// Reads are lock-free: each tenant maps to an `Arc<TenantSnapshot>` and a
/// refresh publishes a complete replacement snapshot in one pointer swap.
/// Readers concurrent with a refresh see either the old snapshot or the new
/// one, never a mixture.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tenants: DashMap<TenantId, Arc<TenantSnapshot>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for a tenant, if one has been published.
    pub fn snapshot(&self, tenant: &TenantId) -> Option<Arc<TenantSnapshot>> {
        self.tenants.get(tenant).map(|r| Arc::clone(r.value()))
    }

    /// Atomically replace a tenant's visible metadata.
    pub fn replace_tenant(&self, tenant: &TenantId, snapshot: TenantSnapshot) {
        debug!(
            tenant = %tenant,
            tables = snapshot.table_count(),
            relationships = snapshot.relationship_count(),
            "publishing schema snapshot"
        );
        self.tenants.insert(tenant.clone(), Arc::new(snapshot));
    }

    /// Drop all metadata for a tenant.
    pub fn clear(&self, tenant: &TenantId) {
        self.tenants.remove(tenant);
        debug!(tenant = %tenant, "cleared schema snapshot");
    }

    /// Drop all metadata for every tenant.
    pub fn clear_all(&self) {
        self.tenants.clear();
    }

    pub fn get_table(&self, tenant: &TenantId, schema: &str, table: &str) -> Option<Table> {
        self.snapshot(tenant)?.get_table(schema, table).cloned()
    }

    pub fn get_relationships(
        &self,
        tenant: &TenantId,
        schema: &str,
        table: &str,
    ) -> Vec<Relationship> {
        match self.snapshot(tenant) {
            Some(snap) => snap.relationships(schema, table).to_vec(),
            None => Vec::new(),
        }
    }

    pub fn find_relationship(
        &self,
        tenant: &TenantId,
        schema: &str,
        source: &str,
        target: &str,
    ) -> Result<Relationship, QuerestError> {
        let snap = self
            .snapshot(tenant)
            .ok_or_else(|| QuerestError::RelationshipNotFound(target.to_string()))?;
        snap.find_relationship(schema, source, target).cloned()
    }

    pub fn find_relationship_with_hint(
        &self,
        tenant: &TenantId,
        schema: &str,
        source: &str,
        target: &str,
        hint: &str,
    ) -> Result<Relationship, QuerestError> {
        let snap = self
            .snapshot(tenant)
            .ok_or_else(|| QuerestError::RelationshipNotFound(target.to_string()))?;
        snap.find_relationship_with_hint(schema, source, target, hint)
            .cloned()
    }
}
