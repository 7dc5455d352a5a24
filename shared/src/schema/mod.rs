pub mod cache;
pub mod types;

pub use cache::{SchemaCache, TenantSnapshot};
pub use types::{Cardinality, Column, Junction, Relationship, Table};
