//! Canonical Codec & Hasher
//!
//! Deterministic CBOR for the transaction model:
//! - `encode_canonical` produces the unique byte form the hardware device hashes
//! - `decode` parses untrusted bytes into a [`CborValue`] tree
//! - `hash` / `key_hash` are the BLAKE2b digests used for ids and credentials

pub mod decoder;
pub mod encoder;
pub mod hash;
pub mod value;

pub use decoder::{decode, read_value};
pub use encoder::encode_canonical;
pub use hash::{hash, key_hash, Hash28, Hash32};
pub use value::*;

/// Errors raised while reading raw CBOR
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input")]
    Truncated,

    #[error("malformed CBOR: {0}")]
    Malformed(String),

    #[error("unsupported CBOR item: {0}")]
    Unsupported(&'static str),

    #[error("{0} trailing byte(s) after the top-level item")]
    TrailingBytes(usize),

    #[error("duplicate map key")]
    DuplicateMapKey,

    #[error("bignum exceeds the supported integer range")]
    IntegerOverflow,

    #[error("nesting deeper than {} levels", decoder::MAX_DEPTH)]
    NestingTooDeep,
}

impl From<minicbor::decode::Error> for CodecError {
    fn from(e: minicbor::decode::Error) -> Self {
        if e.is_end_of_input() {
            CodecError::Truncated
        } else {
            CodecError::Malformed(e.to_string())
        }
    }
}
