//! Typed values exchanged with the database.
//!
//! SQLite's five storage classes map onto [`Value`]. Integer fidelity: the
//! wire carries integers as decimal strings, so the full `i64` range decodes
//! exactly; a value the server sends that does not parse as an `i64` is
//! reported as a transport error rather than silently truncated.

use crate::error::{DatabaseError, Result};
use crate::proto::WireValue;
use base64::{engine::general_purpose, Engine as _};

/// A single typed database value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Decode a value from its wire encoding.
    pub(crate) fn decode(wire: WireValue) -> Result<Self> {
        match wire {
            WireValue::Null => Ok(Self::Null),
            WireValue::Integer { value } => value.parse::<i64>().map(Self::Integer).map_err(|_| {
                DatabaseError::Transport(format!(
                    "malformed response: integer value {value:?} does not fit in i64"
                ))
            }),
            WireValue::Float { value } => Ok(Self::Real(value)),
            WireValue::Text { value } => Ok(Self::Text(value)),
            WireValue::Blob { base64 } => general_purpose::STANDARD
                .decode(base64.as_bytes())
                .map(Self::Blob)
                .map_err(|e| {
                    DatabaseError::Transport(format!("malformed response: bad blob encoding: {e}"))
                }),
        }
    }

    /// Encode a value for the wire.
    pub(crate) fn encode(&self) -> WireValue {
        match self {
            Self::Null => WireValue::Null,
            Self::Integer(i) => WireValue::Integer { value: i.to_string() },
            Self::Real(f) => WireValue::Float { value: *f },
            Self::Text(s) => WireValue::Text { value: s.clone() },
            Self::Blob(b) => WireValue::Blob { base64: general_purpose::STANDARD.encode(b) },
        }
    }

    /// The integer payload, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, if this is a `Real`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// The text payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The binary payload, if this is a `Blob`.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
