pub mod client;
pub mod config;

pub use client::PgClient;
pub use config::ConnectorConfig;
