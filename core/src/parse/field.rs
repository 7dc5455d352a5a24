//! Field-expression scanning: `name (-> segment | ->> segment)* (::cast)?`
//!
//! One forward pass over the bytes. The name segment is permissive — it runs
//! to the first `->`, `::`, or end of input, so names containing characters
//! outside the identifier alphabet (dotted `schema.table.column` names in
//! particular) are preserved verbatim. JSON path segments and cast targets
//! are validated.

use shared::{QuerestError, Result};

use crate::ast::{Field, JsonStep};

/// Parse a full field expression, consuming the entire input.
pub fn parse_field(input: &str) -> Result<Field> {
  let src = input.as_bytes();

  let mut pos = 0usize;
  while pos < src.len() && !starts_arrow(src, pos) && !starts_cast(src, pos) {
    pos += 1;
  }
  let name = &input[..pos];
  if name.is_empty() {
    return Err(QuerestError::EmptyFieldName);
  }

  let mut json_path = Vec::new();
  while starts_arrow(src, pos) {
    let double = src.get(pos + 1) == Some(&b'>') && src.get(pos + 2) == Some(&b'>');
    pos += if double { 3 } else { 2 };

    let seg_start = pos;
    while pos < src.len() && !starts_arrow(src, pos) && !starts_cast(src, pos) {
      pos += 1;
    }
    let segment = &input[seg_start..pos];
    if segment.is_empty() {
      return Err(QuerestError::InvalidJsonPath);
    }
    json_path.push(json_step(segment, double));
  }

  let cast = if starts_cast(src, pos) {
    let target = &input[pos + 2..];
    if target.is_empty() || !is_identifier(target) {
      return Err(QuerestError::InvalidFieldName(target.to_string()));
    }
    Some(target.to_string())
  } else {
    None
  };

  Ok(Field {
    name: name.to_string(),
    json_path,
    cast,
  })
}

/// An all-digit segment is an array index; the step set has no other index
/// form, so this holds for both `->` and `->>`.
fn json_step(segment: &str, double: bool) -> JsonStep {
  if segment.bytes().all(|b| b.is_ascii_digit()) {
    if let Ok(i) = segment.parse::<i64>() {
      return JsonStep::Index(i);
    }
  }
  if double {
    JsonStep::DoubleArrow(segment.to_string())
  } else {
    JsonStep::Arrow(segment.to_string())
  }
}

fn starts_arrow(src: &[u8], pos: usize) -> bool {
  src.get(pos) == Some(&b'-') && src.get(pos + 1) == Some(&b'>')
}

fn starts_cast(src: &[u8], pos: usize) -> bool {
  src.get(pos) == Some(&b':') && src.get(pos + 1) == Some(&b':')
}

pub(crate) fn is_identifier(s: &str) -> bool {
  !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
