//! Transaction Model & Decoder
//!
//! Typed view of a Cardano transaction envelope:
//! - `Transaction::decode` validates untrusted bytes field by field
//! - `Transaction::encode_canonical` re-emits the canonical form
//! - `Transaction::body_hash` is the transaction id the device signs

pub mod decoder;
pub mod encoder;
mod error;
mod types;

pub use decoder::{decode_body, decode_output, decode_witness_set};
pub use encoder::{body_to_value, output_to_value, witness_set_to_value};
pub use error::*;
pub use types::*;
