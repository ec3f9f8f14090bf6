//! Stats payload parsing
//!
//! The stats endpoint answers with a single line of comma-separated
//! base-10 integers, e.g. `12,1024,512,100000000,50000000,100000000,40000000`.
//! Whitespace around the line and around each field is tolerated.

use crate::models::{MetricsRecord, FIELD_COUNT};
use thiserror::Error;

/// Errors produced while parsing a stats payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("payload is not valid UTF-8")]
    Encoding,

    #[error("expected {expected} fields, found {found}", expected = FIELD_COUNT)]
    Shape { found: usize },

    #[error("field {index} is not an integer: {value:?}")]
    Format { index: usize, value: String },
}

/// Parse a raw response body
pub fn parse_bytes(raw: &[u8]) -> Result<MetricsRecord, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::Encoding)?;
    parse(text)
}

/// Parse a stats payload into a [`MetricsRecord`]
pub fn parse(raw: &str) -> Result<MetricsRecord, ParseError> {
    let parts: Vec<&str> = raw.trim().split(',').collect();

    if parts.len() != FIELD_COUNT {
        return Err(ParseError::Shape { found: parts.len() });
    }

    let mut fields = [0i64; FIELD_COUNT];
    for (index, part) in parts.iter().enumerate() {
        let value = part.trim();
        fields[index] = value.parse::<i64>().map_err(|_| ParseError::Format {
            index,
            value: value.to_string(),
        })?;
    }

    Ok(MetricsRecord::from(fields))
}
