//! Shared types for the querest workspace.
//!
//! Everything that crosses a crate boundary lives here: the error taxonomy,
//! tenant identity, schema metadata, the process-wide schema cache, and the
//! configuration structs the embedding application fills in.

pub mod config;
pub mod error;
pub mod schema;
pub mod tenant;

pub use error::{QuerestError, Result};
pub use tenant::TenantId;
