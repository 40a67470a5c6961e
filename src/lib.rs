//! Cardano Hardware-Wallet Signing Core
//!
//! Host-side logic for signing Cardano transactions with a hardware wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **codec**: Canonical CBOR encoding, untrusted decoding, BLAKE2b hashing
//! - **tx**: Transaction model, envelope decoding, body re-encoding
//! - **signing**: Mode classification, policy validation, witness assembly
//! - **error**: A single serializable error for the crate boundary
//!
//! The device itself sits behind the [`DeviceSession`] trait. The core never
//! opens a transport; it prepares parameters, checks the device's answer and
//! builds the final bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use cardano_hw_signing::{sign_with_device, Network, SigningPurpose, Transaction};
//!
//! let tx = Transaction::from_hex(&tx_hex)?;
//! let signed = sign_with_device(&session, &tx, &descriptors, SigningPurpose::Sign, Network::MAINNET).await?;
//! println!("{}", serde_json::to_string_pretty(&signed.text_envelope())?);
//! ```

pub mod codec;
pub mod error;
pub mod serde_bytes;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, HwSignError, HwSignResult};
pub use types::*;

pub use codec::{CborValue, CodecError, Hash28, Hash32};
pub use tx::{DecodeError, Transaction, TransactionBody, TxInput, TxOutput, WitnessSet};

pub use signing::{
    assemble, classify, sign_with_device, validate, AssemblyError, ClassificationError,
    DerivationPath, DeviceError, DeviceResponse, DeviceSession, DeviceSignature,
    HwSigningDescriptor, HwSigningRecord, KeyRole, PolicyError, SignFlowError, SignedOutput,
    SigningMode, SigningParameters, SigningPurpose, TextEnvelope,
};
