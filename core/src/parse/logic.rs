//! Boolean combinator parsing: `and=(...)`, `or=(...)`, and their `not.`
//! forms.
//!
//! Conditions are split at commas at the current parenthesis depth only —
//! filter payloads carry commas inside `(...)` and `{...}`, and nested
//! combinators carry whole condition lists. The splitter is a character
//! scan with explicit depth tracking.

use shared::config::CompilerLimits;
use shared::{QuerestError, Result};

use crate::ast::{Condition, LogicOp, LogicTree};

use super::{field, filter};

/// Recognize a logic key; returns the combinator and its negation flag.
pub fn logic_key(key: &str) -> Option<(LogicOp, bool)> {
  match key {
    "and" => Some((LogicOp::And, false)),
    "or" => Some((LogicOp::Or, false)),
    "not.and" => Some((LogicOp::And, true)),
    "not.or" => Some((LogicOp::Or, true)),
    _ => None,
  }
}

/// Parse the parenthesized condition list of a logic key.
pub fn parse_logic_value(
  op: LogicOp,
  negated: bool,
  value: &str,
  depth: usize,
  limits: &CompilerLimits,
) -> Result<LogicTree> {
  if depth > limits.max_depth {
    return Err(QuerestError::DepthExceeded(limits.max_depth));
  }
  let inner = value
    .strip_prefix('(')
    .and_then(|s| s.strip_suffix(')'))
    .ok_or(QuerestError::LogicNotParenthesized)?;

  let mut conditions = Vec::new();
  for part in split_conditions(inner)? {
    conditions.push(parse_condition(part.trim(), depth, limits)?);
  }
  Ok(LogicTree {
    op,
    negated,
    conditions,
  })
}

/// Split at commas at depth zero. `(`/`)` nest with underflow and residue
/// errors; `{`/`}` only suppress splitting (list payloads).
fn split_conditions(src: &str) -> Result<Vec<&str>> {
  let mut parts = Vec::new();
  let mut paren = 0usize;
  let mut brace = 0usize;
  let mut start = 0usize;

  for (i, c) in src.char_indices() {
    match c {
      '(' => paren += 1,
      ')' => {
        paren = paren
          .checked_sub(1)
          .ok_or(QuerestError::UnexpectedClosingParenthesis)?;
      }
      '{' => brace += 1,
      '}' => brace = brace.saturating_sub(1),
      ',' if paren == 0 && brace == 0 => {
        parts.push(&src[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  if paren > 0 {
    return Err(QuerestError::UnclosedLogicParenthesis);
  }
  parts.push(&src[start..]);
  Ok(parts)
}

fn parse_condition(src: &str, depth: usize, limits: &CompilerLimits) -> Result<Condition> {
  if src.is_empty() {
    return Err(QuerestError::InvalidFilterFormat(src.to_string()));
  }

  // Nested combinator, written inline as `and(...)` etc.
  for (prefix, op, negated) in [
    ("and(", LogicOp::And, false),
    ("or(", LogicOp::Or, false),
    ("not.and(", LogicOp::And, true),
    ("not.or(", LogicOp::Or, true),
  ] {
    if src.starts_with(prefix) {
      let value = &src[prefix.len() - 1..];
      let tree = parse_logic_value(op, negated, value, depth + 1, limits)?;
      return Ok(Condition::Group(tree));
    }
  }
  // A combinator head without its parenthesized body.
  if heads_like_combinator(src) {
    return Err(QuerestError::InvalidNestedLogic(src.to_string()));
  }

  // Equals-notation: `field=op.value`, accepted for parity with top-level
  // filter syntax.
  if let Some(eq) = src.find('=') {
    let f = field::parse_field(&src[..eq])?;
    let ov = filter::parse_op_value(&src[eq + 1..])?;
    return Ok(Condition::Filter(build_filter(f, ov)));
  }

  // Dot-notation: `field.op.value` (including `field.not.op.value`). The
  // field may itself contain dots, so scan split points left to right and
  // take the first whose tail parses as an operator expression.
  let bytes = src.as_bytes();
  for (i, b) in bytes.iter().enumerate() {
    if *b != b'.' || i == 0 {
      continue;
    }
    if let Ok(ov) = filter::parse_op_value(&src[i + 1..]) {
      let f = field::parse_field(&src[..i])?;
      return Ok(Condition::Filter(build_filter(f, ov)));
    }
  }
  Err(QuerestError::InvalidFilterFormat(src.to_string()))
}

fn heads_like_combinator(src: &str) -> bool {
  let head = src.split(['(', '.', '=']).next().unwrap_or("");
  matches!(head, "and" | "or") && !src.contains('=') && {
    // `and.x` has no operator tail; a field actually named `and` with a
    // valid tail is handled by the dot-notation scan instead.
    src
      .strip_prefix(head)
      .and_then(|r| r.strip_prefix('.'))
      .map(|tail| filter::parse_op_value(tail).is_err())
      .unwrap_or(true)
  }
}

fn build_filter(f: crate::ast::Field, ov: filter::OpValue) -> crate::ast::Filter {
  crate::ast::Filter {
    field: f,
    op: ov.op,
    quantifier: ov.quantifier,
    language: ov.language,
    negated: ov.negated,
    value: ov.value,
  }
}
