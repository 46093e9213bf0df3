use crate::models::AgeValue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{0} ID must be a number")]
    InvalidId(&'static str),

    #[error("Invalid age value")]
    InvalidAge,
}

/// Parse a path identifier such as `/api/pets/{id}`
///
/// Only plain positive decimal integers are accepted.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<i32, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidId(entity));
    }
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ParseError::InvalidId(entity)),
    }
}

/// Interpret a client-supplied age
///
/// Strings are read by their leading integer (`"4 years"` is 4); floats are
/// truncated. Negative or missing values are rejected.
pub fn parse_age(value: &AgeValue) -> Result<i32, ParseError> {
    let age = match value {
        AgeValue::Integer(n) => *n,
        AgeValue::Float(f) if f.is_finite() => f.trunc() as i64,
        AgeValue::Float(_) => return Err(ParseError::InvalidAge),
        AgeValue::Text(s) => leading_integer(s).ok_or(ParseError::InvalidAge)?,
    };

    i32::try_from(age)
        .ok()
        .filter(|a| *a >= 0)
        .ok_or(ParseError::InvalidAge)
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
