//! Filter value parsing: `(not.)?op((modifier))?.payload`.
//!
//! The value splits at the first `.` after the operator token (and after an
//! optional `not.` prefix). Everything past that dot is the payload, whose
//! interpretation depends on the operator: `in`/`ov` take a parenthesized
//! list, quantified operators take a braced list, and the rest take an
//! opaque scalar.

use shared::{QuerestError, Result};

use crate::ast::{Filter, FilterOp, FilterValue, Quantifier};

use super::field;

/// Parse one `key=value` filter pair.
pub fn parse_filter(key: &str, value: &str) -> Result<Filter> {
  let f = field::parse_field(key)?;
  let ov = parse_op_value(value)?;
  Ok(Filter {
    field: f,
    op: ov.op,
    quantifier: ov.quantifier,
    language: ov.language,
    negated: ov.negated,
    value: ov.value,
  })
}

/// Operator side of a filter, before the field is attached.
pub(crate) struct OpValue {
  pub op: FilterOp,
  pub quantifier: Option<Quantifier>,
  pub language: Option<String>,
  pub negated: bool,
  pub value: FilterValue,
}

pub(crate) fn parse_op_value(raw: &str) -> Result<OpValue> {
  let (negated, rest) = match raw.strip_prefix("not.") {
    Some(r) => (true, r),
    None => (false, raw),
  };

  let dot = rest
    .find('.')
    .ok_or(QuerestError::MissingOperatorOrValue)?;
  let head = &rest[..dot];
  let payload = &rest[dot + 1..];

  let (op_str, modifier) = match head.find('(') {
    Some(p) if head.ends_with(')') => (&head[..p], Some(&head[p + 1..head.len() - 1])),
    Some(_) => return Err(QuerestError::InvalidFilterFormat(raw.to_string())),
    None => (head, None),
  };
  if op_str.is_empty() {
    return Err(QuerestError::MissingOperatorOrValue);
  }
  let op = FilterOp::parse(op_str)
    .ok_or_else(|| QuerestError::UnknownOperator(op_str.to_string()))?;

  let mut quantifier = None;
  let mut language = None;
  match modifier {
    Some(m @ ("any" | "all")) => {
      // `fts(any)` lands here too: a quantifier never applies to FTS.
      if !op.supports_quantifier() {
        return Err(QuerestError::QuantifierNotSupported(op.as_str().to_string()));
      }
      quantifier = Some(if m == "any" {
        Quantifier::Any
      } else {
        Quantifier::All
      });
    }
    Some(lang) => {
      if !op.is_fts() {
        return Err(QuerestError::InvalidFilterFormat(raw.to_string()));
      }
      language = Some(lang.to_string());
    }
    None => {}
  }

  let value = parse_payload(op, quantifier.is_some(), payload)?;

  Ok(OpValue {
    op,
    quantifier,
    language,
    negated,
    value,
  })
}

fn parse_payload(op: FilterOp, quantified: bool, payload: &str) -> Result<FilterValue> {
  if quantified {
    let inner = payload
      .strip_prefix('{')
      .and_then(|s| s.strip_suffix('}'))
      .ok_or(QuerestError::ExpectedListFormat)?;
    return Ok(FilterValue::List(split_items(inner)));
  }
  if op.takes_list() {
    let inner = payload
      .strip_prefix('(')
      .and_then(|s| s.strip_suffix(')'))
      .ok_or(QuerestError::ExpectedListFormat)?;
    return Ok(FilterValue::List(split_items(inner)));
  }
  Ok(FilterValue::Scalar(payload.to_string()))
}

/// Split a list payload at top-level commas. Items are trimmed; a
/// double-quoted item keeps its commas and may escape quotes with `\"`.
/// The empty payload yields a single empty-string item.
fn split_items(src: &str) -> Vec<String> {
  let mut items = Vec::new();
  let mut start = 0usize;
  let mut in_quotes = false;
  let mut escaped = false;

  for (i, c) in src.char_indices() {
    if in_quotes {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == '"' {
        in_quotes = false;
      }
      continue;
    }
    match c {
      '"' => in_quotes = true,
      ',' => {
        items.push(clean_item(&src[start..i]));
        start = i + 1;
      }
      _ => {}
    }
  }
  items.push(clean_item(&src[start..]));
  items
}

fn clean_item(raw: &str) -> String {
  let t = raw.trim();
  if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
    let inner = &t[1..t.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
      if escaped {
        out.push(c);
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else {
        out.push(c);
      }
    }
    out
  } else {
    t.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::JsonStep;

  #[test]
  fn simple_equality() {
    let f = parse_filter("id", "eq.1").unwrap();
    assert_eq!(f.op, FilterOp::Eq);
    assert!(!f.negated);
    assert_eq!(f.value, FilterValue::Scalar("1".to_string()));
  }

  #[test]
  fn negation_prefix() {
    let f = parse_filter("status", "not.eq.active").unwrap();
    assert!(f.negated);
    assert_eq!(f.op, FilterOp::Eq);
    assert_eq!(f.value, FilterValue::Scalar("active".to_string()));
  }

  #[test]
  fn payload_keeps_dots() {
    let f = parse_filter("version", "eq.1.2.3").unwrap();
    assert_eq!(f.value, FilterValue::Scalar("1.2.3".to_string()));
  }

  #[test]
  fn in_list() {
    let f = parse_filter("id", "in.(1,2,3)").unwrap();
    assert_eq!(f.op, FilterOp::In);
    assert_eq!(
      f.value,
      FilterValue::List(vec!["1".into(), "2".into(), "3".into()])
    );
  }

  #[test]
  fn in_list_quoted_items() {
    let f = parse_filter("name", r#"in.("a,b","say \"hi\"",plain)"#).unwrap();
    assert_eq!(
      f.value,
      FilterValue::List(vec![
        "a,b".to_string(),
        r#"say "hi""#.to_string(),
        "plain".to_string(),
      ])
    );
  }

  #[test]
  fn empty_in_list_is_one_empty_item() {
    let f = parse_filter("id", "in.()").unwrap();
    assert_eq!(f.value, FilterValue::List(vec![String::new()]));
  }

  #[test]
  fn in_requires_parens() {
    assert!(matches!(
      parse_filter("id", "in.1,2"),
      Err(QuerestError::ExpectedListFormat)
    ));
  }

  #[test]
  fn quantified_comparison() {
    let f = parse_filter("id", "eq(any).{1,2,3}").unwrap();
    assert_eq!(f.quantifier, Some(Quantifier::Any));
    assert_eq!(
      f.value,
      FilterValue::List(vec!["1".into(), "2".into(), "3".into()])
    );
  }

  #[test]
  fn quantified_requires_braces() {
    assert!(matches!(
      parse_filter("id", "eq(all).(1,2)"),
      Err(QuerestError::ExpectedListFormat)
    ));
  }

  #[test]
  fn quantifier_rejected_on_fts() {
    assert!(matches!(
      parse_filter("doc", "fts(any).cat"),
      Err(QuerestError::QuantifierNotSupported(op)) if op == "fts"
    ));
  }

  #[test]
  fn quantifier_rejected_on_in() {
    assert!(matches!(
      parse_filter("id", "in(all).{1}"),
      Err(QuerestError::QuantifierNotSupported(_))
    ));
  }

  #[test]
  fn fts_language_modifier() {
    let f = parse_filter("doc", "plfts(german).katze").unwrap();
    assert_eq!(f.op, FilterOp::Plfts);
    assert_eq!(f.language.as_deref(), Some("german"));
    assert_eq!(f.value, FilterValue::Scalar("katze".to_string()));
  }

  #[test]
  fn language_modifier_rejected_off_fts() {
    assert!(matches!(
      parse_filter("id", "eq(german).1"),
      Err(QuerestError::InvalidFilterFormat(_))
    ));
  }

  #[test]
  fn containment_payload_is_opaque() {
    let f = parse_filter("tags", "cs.{a,b}").unwrap();
    assert_eq!(f.value, FilterValue::Scalar("{a,b}".to_string()));
  }

  #[test]
  fn unknown_operator() {
    assert!(matches!(
      parse_filter("id", "contains.5"),
      Err(QuerestError::UnknownOperator(op)) if op == "contains"
    ));
  }

  #[test]
  fn missing_value() {
    assert!(matches!(
      parse_filter("id", "eq"),
      Err(QuerestError::MissingOperatorOrValue)
    ));
    assert!(matches!(
      parse_filter("id", ""),
      Err(QuerestError::MissingOperatorOrValue)
    ));
  }

  #[test]
  fn json_path_key() {
    let f = parse_filter("data->>name", "eq.test").unwrap();
    assert_eq!(f.field.name, "data");
    assert_eq!(
      f.field.json_path,
      vec![JsonStep::DoubleArrow("name".to_string())]
    );
  }

  #[test]
  fn is_payload_is_deferred_to_emission() {
    // The parser stays permissive; the emitter enforces the closed set.
    let f = parse_filter("flag", "is.maybe").unwrap();
    assert_eq!(f.op, FilterOp::Is);
    assert_eq!(f.value, FilterValue::Scalar("maybe".to_string()));
  }
}
