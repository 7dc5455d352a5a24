//! Positional parameter values and numeric coercion.

use rust_decimal::Decimal;
use serde::Serialize;

/// A value bound to a `$n` placeholder.
///
/// Serializes untagged, so a parameter list becomes a plain JSON array
/// (`[1, "a", [2, 3]]`) ready to hand to a PostgreSQL-protocol client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
  Int(i64),
  Num(Decimal),
  Text(String),
  List(Vec<SqlParam>),
}

impl SqlParam {
  /// Coerce a raw string value: integer-parseable strings become integers,
  /// decimal-parseable become a numeric, everything else stays text.
  pub fn coerce(raw: &str) -> Self {
    if let Ok(i) = raw.parse::<i64>() {
      return Self::Int(i);
    }
    if raw.contains('.') {
      if let Ok(d) = raw.parse::<Decimal>() {
        return Self::Num(d);
      }
    }
    Self::Text(raw.to_string())
  }

  /// Coerce every element of a list into one array-shaped parameter.
  pub fn coerce_list(items: &[String]) -> Self {
    Self::List(items.iter().map(|i| Self::coerce(i)).collect())
  }
}
