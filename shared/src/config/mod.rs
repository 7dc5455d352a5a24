use serde::Deserialize;

/// Settings for a schema cache refresh.
///
/// The embedding application constructs this (from its own configuration
/// surface) and hands it to the refresher; there is no file or environment
/// loading here.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Hard timeout for the catalog introspection queries, in seconds.
    /// On expiry the previously visible snapshot is retained.
    #[serde(default = "default_refresh_timeout")]
    pub timeout_secs: u64,
    /// Schemas to introspect. Tables and relationships outside these
    /// schemas are invisible to the compiler.
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_refresh_timeout(),
            schemas: default_schemas(),
        }
    }
}

/// Guard rails for the recursive parts of the query grammar.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CompilerLimits {
    /// Maximum nesting depth accepted by the select and logic parsers.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for CompilerLimits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

// ── Default value functions ─────────────────────────────────────────

fn default_refresh_timeout() -> u64 {
    30
}
fn default_schemas() -> Vec<String> {
    vec!["public".to_string()]
}
fn default_max_depth() -> usize {
    32
}
