//! PostgreSQL collaborator for the querest schema cache.
//!
//! Owns the catalog introspection queries and the refresh operation that
//! turns their results into immutable tenant snapshots. The compiler itself
//! never talks to the database; it only reads the cache this crate fills.

pub mod connector;
pub mod schema;

pub use connector::{ConnectorConfig, PgClient};
pub use schema::cardinality::{derive_relationships, RawForeignKey, RawKey};
pub use schema::refresh::{RefreshStats, SchemaRefresher};
