//! Generic CBOR value tree
//!
//! Every decoded item lands here before it is mapped onto the typed
//! transaction model. Fields the model does not interpret (update proposals,
//! governance data, auxiliary data) are kept as `CborValue` so they can be
//! re-emitted without loss of meaning.

use super::encoder::encode_canonical;
use std::cmp::Ordering;

/// Tag for positive bignums (RFC 8949 §3.4.3)
pub const TAG_POSITIVE_BIGNUM: u64 = 2;
/// Tag for negative bignums
pub const TAG_NEGATIVE_BIGNUM: u64 = 3;
/// Tag wrapping embedded CBOR bytes
pub const TAG_ENCODED_CBOR: u64 = 24;
/// Tag for rational numbers (unit intervals)
pub const TAG_RATIONAL: u64 = 30;
/// Tag marking a mathematical set
pub const TAG_SET: u64 = 258;

/// A structured CBOR value
///
/// Integers are held in an `i128` so that the full native CBOR range
/// `[-2^64, 2^64 - 1]` and bignums slightly beyond it round-trip exactly.
/// Tags 2 and 3 never appear in a decoded tree; they are folded into `Int`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CborValue {
    Int(i128),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    /// Entries are kept in canonical key order, see [`CborValue::map`]
    Map(Vec<(CborValue, CborValue)>),
    Tag(u64, Box<CborValue>),
    Bool(bool),
    Null,
    Undefined,
    Simple(u8),
}

impl CborValue {
    /// Build a map with entries sorted into canonical key order.
    ///
    /// Maps built this way compare equal regardless of the order the
    /// entries were supplied in.
    pub fn map(mut entries: Vec<(CborValue, CborValue)>) -> Self {
        entries.sort_by(|(a, _), (b, _)| canonical_key_order(a, b));
        CborValue::Map(entries)
    }

    pub fn uint(value: u64) -> Self {
        CborValue::Int(i128::from(value))
    }

    pub fn tagged(tag: u64, inner: CborValue) -> Self {
        CborValue::Tag(tag, Box::new(inner))
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CborValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CborValue::Null)
    }

    /// Short name of the CBOR major type, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            CborValue::Int(_) => "integer",
            CborValue::Bytes(_) => "bytes",
            CborValue::Text(_) => "text",
            CborValue::Array(_) => "array",
            CborValue::Map(_) => "map",
            CborValue::Tag(..) => "tag",
            CborValue::Bool(_) => "bool",
            CborValue::Null => "null",
            CborValue::Undefined => "undefined",
            CborValue::Simple(_) => "simple",
        }
    }
}

/// Length-first, then bytewise ordering of encoded keys (RFC 7049 §3.9)
pub fn canonical_key_order(a: &CborValue, b: &CborValue) -> Ordering {
    let a = encode_canonical(a);
    let b = encode_canonical(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
}

impl From<u64> for CborValue {
    fn from(value: u64) -> Self {
        CborValue::uint(value)
    }
}

impl From<i64> for CborValue {
    fn from(value: i64) -> Self {
        CborValue::Int(i128::from(value))
    }
}

impl From<&[u8]> for CborValue {
    fn from(value: &[u8]) -> Self {
        CborValue::Bytes(value.to_vec())
    }
}

impl From<&str> for CborValue {
    fn from(value: &str) -> Self {
        CborValue::Text(value.to_string())
    }
}
