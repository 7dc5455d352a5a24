//! Query-string decomposition and per-key dispatch.
//!
//! Keys route to one of four sublanguage parsers: reserved keys (`select`,
//! `order`, `limit`, `offset`) to their dedicated parsers, logic keys
//! (`and`, `or`, `not.and`, `not.or`) to the logic parser, and everything
//! else to the filter parser. Repeated filter keys each contribute a filter;
//! a repeated reserved key replaces the earlier occurrence.

pub mod field;
pub mod filter;
pub mod logic;
pub mod order;
pub mod select;

use shared::config::CompilerLimits;
use shared::{QuerestError, Result};

use crate::ast::{Condition, ParsedParams};

/// Decode an `application/x-www-form-urlencoded` query string and parse it.
pub fn parse_query_string(qs: &str, limits: &CompilerLimits) -> Result<ParsedParams> {
  let raw = qs.strip_prefix('?').unwrap_or(qs);
  let pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
    .into_owned()
    .collect();
  parse_pairs(&pairs, limits)
}

/// Parse already-decoded key/value pairs, in order.
pub fn parse_pairs(pairs: &[(String, String)], limits: &CompilerLimits) -> Result<ParsedParams> {
  let mut params = ParsedParams::default();
  for (key, value) in pairs {
    dispatch_pair(&mut params, key, value, limits)?;
  }
  Ok(params)
}

/// True for keys that never name a filter field.
pub fn is_reserved_key(key: &str) -> bool {
  matches!(
    key,
    "select" | "order" | "limit" | "offset" | "on_conflict" | "columns"
  )
}

fn dispatch_pair(
  params: &mut ParsedParams,
  key: &str,
  value: &str,
  limits: &CompilerLimits,
) -> Result<()> {
  if key.is_empty() {
    return Err(QuerestError::EmptyFieldName);
  }
  match key {
    "select" => params.select = Some(select::parse_select(value, limits)?),
    "order" => params.order = order::parse_order(value)?,
    "limit" => params.limit = Some(page_bound(value).ok_or(QuerestError::InvalidLimit)?),
    "offset" => params.offset = Some(page_bound(value).ok_or(QuerestError::InvalidOffset)?),
    // Recognized as reserved, but carry no behavior in the compiler; the
    // embedder interprets them.
    "on_conflict" | "columns" => {}
    _ => {
      if let Some((op, negated)) = logic::logic_key(key) {
        let tree = logic::parse_logic_value(op, negated, value, 0, limits)?;
        params.filters.push(Condition::Group(tree));
      } else {
        params
          .filters
          .push(Condition::Filter(filter::parse_filter(key, value)?));
      }
    }
  }
  Ok(())
}

/// Strings only, base 10, no sign, no fraction, no exponent.
fn page_bound(raw: &str) -> Option<u64> {
  let t = raw.trim();
  if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  t.parse::<u64>().ok()
}
