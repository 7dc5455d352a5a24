//! Order expression parsing: comma-separated `field[.direction][.nulls]`
//! terms.
//!
//! Suffixes are recognized from the right: the last dot-segment may be a
//! direction or a nulls option, and a direction may directly precede a nulls
//! option. Any remaining dots belong to the field name, so
//! `schema.table.column.desc` orders by the field `schema.table.column`.

use shared::{QuerestError, Result};

use crate::ast::{Direction, NullsOrder, OrderTerm};

use super::field;

pub fn parse_order(input: &str) -> Result<Vec<OrderTerm>> {
  let mut terms = Vec::new();
  let parts: Vec<&str> = input.split(',').collect();
  let last = parts.len().saturating_sub(1);
  for (i, part) in parts.iter().enumerate() {
    let t = part.trim();
    if t.is_empty() {
      if i == last && i > 0 {
        continue; // trailing comma
      }
      return Err(QuerestError::EmptyFieldName);
    }
    terms.push(parse_term(t)?);
  }
  Ok(terms)
}

fn parse_term(term: &str) -> Result<OrderTerm> {
  let segs: Vec<&str> = term.split('.').collect();
  let mut end = segs.len();
  let mut direction = None;
  let mut nulls = None;

  if end >= 2 {
    let last = segs[end - 1];
    if let Some(d) = direction_token(last) {
      if end >= 3 && nulls_token(segs[end - 2]).is_some() {
        return Err(QuerestError::InvalidOrderOptions(term.to_string()));
      }
      direction = Some(d);
      end -= 1;
    } else if let Some(n) = nulls_token(last) {
      nulls = Some(n);
      end -= 1;
      if end >= 2 {
        if let Some(d) = direction_token(segs[end - 1]) {
          direction = Some(d);
          end -= 1;
        }
      }
    }
  }

  let field_src = segs[..end].join(".");
  let mut f = field::parse_field(&field_src)?;
  // Casts have no meaning in an order term.
  f.cast = None;

  Ok(OrderTerm {
    field: f,
    direction: direction.unwrap_or(Direction::Asc),
    nulls,
  })
}

fn direction_token(s: &str) -> Option<Direction> {
  match s {
    "asc" => Some(Direction::Asc),
    "desc" => Some(Direction::Desc),
    _ => None,
  }
}

fn nulls_token(s: &str) -> Option<NullsOrder> {
  match s {
    "nullsfirst" => Some(NullsOrder::First),
    "nullslast" => Some(NullsOrder::Last),
    _ => None,
  }
}
