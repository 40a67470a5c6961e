//! Decoder errors
//!
//! Every variant names the field that failed so a rejected envelope can be
//! reported precisely instead of as a generic parse failure.

use crate::codec::CodecError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("transaction envelope must have 3 or 4 elements, got {0}")]
    InvalidEnvelope(usize),

    #[error("field `{field}`: expected {expected}, found {found}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field `{field}`: expected {expected} element(s), got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("field `{field}`: expected {expected} bytes, got {actual}")]
    InvalidByteLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("field `{0}`: negative value where an unsigned integer is expected")]
    NegativeValue(&'static str),

    #[error("field `{0}`: integer out of range")]
    IntegerOverflow(&'static str),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("field `{0}` contains a duplicate element")]
    DuplicateSetElement(&'static str),

    #[error("field `{field}`: unexpected key {key}")]
    UnexpectedKey { field: &'static str, key: u64 },

    #[error("field `{field}`: unexpected tag {tag}")]
    UnexpectedTag { field: &'static str, tag: u64 },

    #[error("field `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    #[error("unsupported certificate type {0}")]
    UnsupportedCertificateType(u64),

    #[error("unsupported relay type {0}")]
    UnsupportedRelayType(u64),

    #[error("unsupported credential type {0}")]
    UnsupportedCredentialType(u64),

    #[error("unsupported datum option {0}")]
    UnsupportedDatumOption(u64),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
