//! Select projection parsing.
//!
//! ```text
//! items    := item ("," item)* ","?
//! item     := ("...")? (alias ":")? core children?
//! core     := "*" | field-expr | relation-name ("!" hint)?
//! children := "(" items? ")"
//! ```
//!
//! An item followed by a child block is a relation; a `...` prefix makes it
//! a spread; everything else is a field. Alias extraction is `::`-aware: in
//! `price::text:price_str` the alias follows the cast.

use shared::config::CompilerLimits;
use shared::{QuerestError, Result};

use crate::ast::SelectItem;

use super::field;

/// Parse a full select value. Empty input yields the empty list.
pub fn parse_select(input: &str, limits: &CompilerLimits) -> Result<Vec<SelectItem>> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Ok(Vec::new());
  }
  parse_items(trimmed, 0, limits)
}

fn parse_items(src: &str, depth: usize, limits: &CompilerLimits) -> Result<Vec<SelectItem>> {
  if depth > limits.max_depth {
    return Err(QuerestError::DepthExceeded(limits.max_depth));
  }
  let mut items = Vec::new();
  for part in split_items(src)? {
    items.push(parse_item(part, depth, limits)?);
  }
  Ok(items)
}

/// Split at top-level commas. A single trailing comma is permitted;
/// consecutive commas are not.
fn split_items(src: &str) -> Result<Vec<&str>> {
  let mut parts = Vec::new();
  let mut paren = 0usize;
  let mut start = 0usize;

  for (i, c) in src.char_indices() {
    match c {
      '(' => paren += 1,
      ')' => {
        paren = paren
          .checked_sub(1)
          .ok_or(QuerestError::UnexpectedToken)?;
      }
      ',' if paren == 0 => {
        parts.push(&src[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  if paren > 0 {
    return Err(QuerestError::UnclosedParenthesis);
  }
  let last = &src[start..];
  if last.trim().is_empty() {
    // `a,b,` is fine; `a,,b` is caught below.
    if parts.is_empty() {
      return Err(QuerestError::UnexpectedToken);
    }
  } else {
    parts.push(last);
  }
  if parts.iter().any(|p| p.trim().is_empty()) {
    return Err(QuerestError::UnexpectedToken);
  }
  Ok(parts)
}

fn parse_item(raw: &str, depth: usize, limits: &CompilerLimits) -> Result<SelectItem> {
  let s = raw.trim();
  let (spread, s) = match s.strip_prefix("...") {
    Some(rest) => (true, rest),
    None => (false, s),
  };

  let (head, children) = match s.find('(') {
    Some(open) => {
      let close = matching_paren(s, open)?;
      if close != s.len() - 1 {
        return Err(QuerestError::UnexpectedToken);
      }
      let inner = &s[open + 1..close];
      let children = if inner.trim().is_empty() {
        Vec::new()
      } else {
        parse_items(inner, depth + 1, limits)?
      };
      (&s[..open], Some(children))
    }
    None => (s, None),
  };

  let (alias, expr) = extract_alias(head);

  if children.is_some() || spread {
    let (name, hint) = match expr.find('!') {
      Some(bang) => (&expr[..bang], Some(expr[bang + 1..].to_string())),
      None => (expr, None),
    };
    if name.is_empty() {
      return Err(QuerestError::EmptyFieldName);
    }
    let name = name.to_string();
    let children = children.unwrap_or_default();
    return Ok(if spread {
      SelectItem::Spread {
        name,
        alias,
        hint,
        children,
      }
    } else {
      SelectItem::Relation {
        name,
        alias,
        hint,
        children,
      }
    });
  }

  if expr == "*" {
    return Ok(SelectItem::Field {
      name: "*".to_string(),
      alias,
      json_path: Vec::new(),
      cast: None,
    });
  }

  // A `!` on a plain field is not a hint; it stays in the name.
  let f = field::parse_field(expr)?;
  Ok(SelectItem::Field {
    name: f.name,
    alias,
    json_path: f.json_path,
    cast: f.cast,
  })
}

/// Alias extraction. With a `::` cast the alias follows the cast
/// (`price::text:price_str`); without one it precedes the first `:`.
fn extract_alias(head: &str) -> (Option<String>, &str) {
  if let Some(ci) = head.find("::") {
    let after = &head[ci + 2..];
    if let Some(ai) = after.find(':') {
      let alias = &after[ai + 1..];
      let expr = &head[..ci + 2 + ai];
      return (non_empty(alias), expr);
    }
    return (None, head);
  }
  if let Some(ci) = head.find(':') {
    return (non_empty(&head[..ci]), &head[ci + 1..]);
  }
  (None, head)
}

fn non_empty(s: &str) -> Option<String> {
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

fn matching_paren(s: &str, open: usize) -> Result<usize> {
  let mut depth = 0usize;
  for (i, c) in s[open..].char_indices() {
    match c {
      '(' => depth += 1,
      ')' => {
        depth -= 1;
        if depth == 0 {
          return Ok(open + i);
        }
      }
      _ => {}
    }
  }
  Err(QuerestError::UnclosedParenthesis)
}
