pub mod types;

pub use types::QuerestError;

/// Shorthand Result type used throughout querest.
pub type Result<T> = std::result::Result<T, QuerestError>;
