//! # querest-core
//!
//! Compiles PostgREST-style URL query strings into parameterized PostgreSQL
//! `SELECT` statements.
//!
//! ## Pipeline
//!
//! ```text
//! query string
//!  └─► decompose + dispatch (parse)
//!       ├─► FilterParser   field.op.value pairs
//!       ├─► LogicParser    and=(...) / or=(...) trees
//!       ├─► SelectParser   projections and embedded relations
//!       └─► OrderParser    order terms
//!            └─► ParsedParams (ast)
//!                 └─► SqlEmitter (sql)
//!                      └─► {sql, params, tables}
//! ```
//!
//! Parsing and emission are pure: no I/O, no shared state, one allocation
//! region per request. Relation embedding is the only side lookup — it reads
//! one immutable snapshot from the schema cache per request.
//!
//! ## Quick start
//!
//! ```
//! use querest_core::query_string_to_sql;
//!
//! let q = query_string_to_sql("users", "select=id,name&age=gte.21&order=name").unwrap();
//! assert_eq!(
//!     q.sql,
//!     r#"SELECT "id", "name" FROM "users" WHERE "age" >= $1 ORDER BY "name" ASC"#
//! );
//! ```

pub mod ast;
pub mod params;
pub mod parse;
pub mod sql;

use shared::config::CompilerLimits;
use shared::schema::SchemaCache;
use shared::{Result, TenantId};

pub use ast::ParsedParams;
pub use params::SqlParam;
pub use sql::relation::to_sql_with_relations;
pub use sql::{build_filter_clause, to_sql, FilterClause, SqlQuery};

/// Decode and parse a query string with the default compiler limits.
pub fn parse_query_string(qs: &str) -> Result<ParsedParams> {
  parse::parse_query_string(qs, &CompilerLimits::default())
}

/// Parse already-decoded key/value pairs with the default compiler limits.
pub fn parse_pairs(pairs: &[(String, String)]) -> Result<ParsedParams> {
  parse::parse_pairs(pairs, &CompilerLimits::default())
}

/// Compile a query string against a table, without relation embedding.
pub fn query_string_to_sql(table: &str, qs: &str) -> Result<SqlQuery> {
  let params = parse_query_string(qs)?;
  to_sql(table, &params)
}

/// Compile a query string against a table, embedding relations through the
/// schema cache.
pub fn query_string_to_sql_with_relations(
  cache: &SchemaCache,
  tenant: &TenantId,
  schema: &str,
  table: &str,
  qs: &str,
) -> Result<SqlQuery> {
  let params = parse_query_string(qs)?;
  to_sql_with_relations(cache, tenant, schema, table, &params)
}
