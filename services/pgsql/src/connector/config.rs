use serde::Deserialize;

/// Connection settings for the introspection client.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
  /// PostgreSQL connection string.
  pub connection_string: String,
  /// Application name shown in `pg_stat_activity`.
  #[serde(default = "default_app_name")]
  pub application_name: String,
}

fn default_app_name() -> String {
  "querest".to_string()
}
