//! Leaf value parsing for broker payloads.
//!
//! Broker statistics arrive as JSON numbers or strings. Strings are either
//! stringified numbers or human byte sizes such as `"123.19M"`; anything else
//! is not a metric and is skipped by the caller.

use serde_json::Value;
use thiserror::Error;

const KILO: f64 = 1024.0;
const MEGA: f64 = KILO * 1024.0;
const GIGA: f64 = MEGA * 1024.0;
const TERA: f64 = GIGA * 1024.0;
const PETA: f64 = TERA * 1024.0;

/// Scalar view of a JSON payload value. Arrays, objects, booleans and null
/// map to `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Number(f64),
    Text(String),
    Other,
}

impl From<&Value> for Leaf {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Leaf::Number(f),
                None => Leaf::Other,
            },
            Value::String(s) => Leaf::Text(s.clone()),
            _ => Leaf::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("can't parse {0:?} as a float or a byte size")]
    Unparseable(String),
}

/// Parses a string metric value: a plain float first, a human byte size
/// (powers of 1024, optional trailing `B`, case-insensitive) second.
pub fn parse_value(raw: &str) -> Result<f64, ValueError> {
    if let Ok(f) = raw.trim().parse::<f64>() {
        if f.is_finite() {
            return Ok(f);
        }
        return Err(ValueError::Unparseable(raw.to_owned()));
    }
    parse_byte_size(raw)
}

/// Parses human byte sizes such as `512K`, `123.19M` or `1.5GB`. The byte
/// count is truncated to an integer before conversion, so `"123.19M"` maps
/// to exactly 129174077.
fn parse_byte_size(raw: &str) -> Result<f64, ValueError> {
    let mut s = raw.trim().to_uppercase();
    if s.len() > 1 && s.ends_with('B') {
        s.pop();
    }

    let (digits, multiplier) = match s.chars().last() {
        Some('K') => (&s[..s.len() - 1], KILO),
        Some('M') => (&s[..s.len() - 1], MEGA),
        Some('G') => (&s[..s.len() - 1], GIGA),
        Some('T') => (&s[..s.len() - 1], TERA),
        Some('P') => (&s[..s.len() - 1], PETA),
        Some(c) if c.is_ascii_digit() || c == '.' => (s.as_str(), 1.0),
        _ => return Err(ValueError::Unparseable(raw.to_owned())),
    };

    let value: f64 = digits
        .parse()
        .map_err(|_| ValueError::Unparseable(raw.to_owned()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ValueError::Unparseable(raw.to_owned()));
    }

    Ok((value * multiplier).trunc())
}
