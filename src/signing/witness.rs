//! Witness Assembler
//!
//! Turns device signatures into witnesses and folds them into the final
//! output. The host recomputes the canonical body hash independently and
//! refuses to emit anything when it differs from what the device signed.

use super::descriptor::HwSigningDescriptor;
use super::device::DeviceResponse;
use super::params::{SigningParameters, SigningPurpose};
use super::path::DerivationPath;
use crate::codec::{encode_canonical, CborValue, Hash32, TAG_SET};
use crate::tx::{witness_keys, SetEncoding, WitnessSet};
use crate::types::{Era, Network};
use crate::{log_debug, log_warn};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Serialize;
use std::collections::BTreeSet;

const MODULE: &str = "witness";

/// Length of an Ed25519 signature
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Witness {
    Byron {
        public_key: [u8; 32],
        signature: [u8; SIGNATURE_LEN],
        chain_code: [u8; 32],
        /// CBOR-encoded address attributes
        address_attributes: Vec<u8>,
    },
    Shelley {
        public_key: [u8; 32],
        signature: [u8; SIGNATURE_LEN],
    },
}

impl Witness {
    /// Witness-set key this witness is filed under
    pub fn category(&self) -> u64 {
        match self {
            Witness::Byron { .. } => witness_keys::BOOTSTRAP_WITNESSES,
            Witness::Shelley { .. } => witness_keys::VKEY_WITNESSES,
        }
    }

    pub fn to_cbor_value(&self) -> CborValue {
        match self {
            Witness::Shelley {
                public_key,
                signature,
            } => CborValue::Array(vec![
                CborValue::from(&public_key[..]),
                CborValue::from(&signature[..]),
            ]),
            Witness::Byron {
                public_key,
                signature,
                chain_code,
                address_attributes,
            } => CborValue::Array(vec![
                CborValue::from(&public_key[..]),
                CborValue::from(&signature[..]),
                CborValue::from(&chain_code[..]),
                CborValue::from(address_attributes.as_slice()),
            ]),
        }
    }
}

/// A witness and the path of the key that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathWitness {
    pub path: DerivationPath,
    pub witness: Witness,
}

/// Encoded output ready for the file writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOutput {
    pub era: Era,
    pub purpose: SigningPurpose,
    pub cbor: Vec<u8>,
}

/// cardano-cli style text envelope
#[derive(Debug, Clone, Serialize)]
pub struct TextEnvelope {
    #[serde(rename = "type")]
    pub envelope_type: String,
    pub description: String,
    #[serde(rename = "cborHex")]
    pub cbor_hex: String,
}

impl SignedOutput {
    pub fn envelope_type(&self) -> String {
        match self.purpose {
            SigningPurpose::Sign => format!("Witnessed Tx {}", self.era),
            SigningPurpose::Witness => format!("TxWitness {}", self.era),
        }
    }

    pub fn text_envelope(&self) -> TextEnvelope {
        TextEnvelope {
            envelope_type: self.envelope_type(),
            description: String::new(),
            cbor_hex: hex::encode(&self.cbor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("device returned a signature for {0} but no signing file has that path")]
    MissingDescriptorForPath(String),

    #[error("device returned more than one signature for {0}")]
    DuplicateSignatureForPath(String),

    #[error("expected {expected} witness(es), got {actual}")]
    UnexpectedWitnessCount { expected: usize, actual: usize },

    #[error("body hash mismatch: host computed {host}, device signed {device}")]
    SerializationMismatch { host: String, device: String },

    #[error("device did not report the body hash it signed")]
    MissingDeviceHash,

    #[error("signature for {path} is {length} bytes, expected {SIGNATURE_LEN}")]
    InvalidSignatureLength { path: String, length: usize },

    #[error("signature for {0} does not verify against its public key")]
    InvalidSignature(String),

    #[error("existing witness set entry {0} is not a list of witnesses")]
    MalformedWitnessSet(u64),
}

/// CBOR-encoded Byron address attributes for the target network.
///
/// Mainnet addresses carry no attributes; everything else records the
/// protocol magic under key 2.
pub fn byron_address_attributes(network: &Network) -> Vec<u8> {
    if network.is_mainnet() {
        return encode_canonical(&CborValue::map(vec![]));
    }
    let magic = encode_canonical(&CborValue::uint(u64::from(network.protocol_magic)));
    encode_canonical(&CborValue::map(vec![(
        CborValue::uint(2),
        CborValue::Bytes(magic),
    )]))
}

pub fn assemble(
    params: &SigningParameters<'_>,
    response: &DeviceResponse,
) -> Result<SignedOutput, AssemblyError> {
    let host_hash = params.transaction.canonical_body_hash();
    match response.body_hash {
        Some(device_hash) if device_hash != host_hash => {
            log_warn!(
                MODULE,
                "Body hash mismatch",
                host_hash = hex::encode(host_hash),
                device_hash = hex::encode(device_hash)
            );
            return Err(AssemblyError::SerializationMismatch {
                host: hex::encode(host_hash),
                device: hex::encode(device_hash),
            });
        }
        None if params.purpose == SigningPurpose::Sign => {
            return Err(AssemblyError::MissingDeviceHash)
        }
        _ => {}
    }

    let witnesses = build_witnesses(params, response, &host_hash)?;

    let cbor = match params.purpose {
        SigningPurpose::Witness => {
            if witnesses.len() != 1 {
                return Err(AssemblyError::UnexpectedWitnessCount {
                    expected: 1,
                    actual: witnesses.len(),
                });
            }
            let witness = &witnesses[0].witness;
            let category = match witness {
                Witness::Shelley { .. } => 0,
                Witness::Byron { .. } => 1,
            };
            encode_canonical(&CborValue::Array(vec![
                CborValue::uint(category),
                witness.to_cbor_value(),
            ]))
        }
        SigningPurpose::Sign => {
            let merged = merge_witnesses(
                &params.transaction.witness_set,
                &witnesses,
                params.transaction.body.set_encoding,
            )?;
            params.transaction.encode_with_witnesses(&merged)
        }
    };

    log_debug!(
        MODULE,
        "Assembled output",
        purpose = params.purpose,
        witnesses = witnesses.len(),
        era = params.era
    );

    Ok(SignedOutput {
        era: params.era,
        purpose: params.purpose,
        cbor,
    })
}

fn build_witnesses(
    params: &SigningParameters<'_>,
    response: &DeviceResponse,
    body_hash: &Hash32,
) -> Result<Vec<PathWitness>, AssemblyError> {
    let mut seen = BTreeSet::new();
    let mut witnesses = Vec::with_capacity(response.signatures.len());

    for entry in &response.signatures {
        let path = entry.path.to_string();
        let descriptor = params
            .descriptor_for(&entry.path)
            .ok_or_else(|| AssemblyError::MissingDescriptorForPath(path.clone()))?;
        if !seen.insert(&entry.path) {
            return Err(AssemblyError::DuplicateSignatureForPath(path));
        }

        let signature: [u8; SIGNATURE_LEN] =
            entry
                .signature
                .as_slice()
                .try_into()
                .map_err(|_| AssemblyError::InvalidSignatureLength {
                    path: path.clone(),
                    length: entry.signature.len(),
                })?;
        verify_signature(descriptor, body_hash, &signature)
            .map_err(|_| AssemblyError::InvalidSignature(path))?;

        let witness = if entry.path.is_byron() {
            Witness::Byron {
                public_key: descriptor.public_key(),
                signature,
                chain_code: descriptor.chain_code(),
                address_attributes: byron_address_attributes(&params.network),
            }
        } else {
            Witness::Shelley {
                public_key: descriptor.public_key(),
                signature,
            }
        };
        witnesses.push(PathWitness {
            path: entry.path.clone(),
            witness,
        });
    }

    Ok(witnesses)
}

fn verify_signature(
    descriptor: &HwSigningDescriptor,
    message: &Hash32,
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), ed25519_dalek::SignatureError> {
    let key = VerifyingKey::from_bytes(&descriptor.public_key())?;
    key.verify(message, &Signature::from_bytes(signature))
}

/// Append new witnesses to the existing set, one category at a time.
/// Witnesses already present are not repeated. Categories that receive
/// nothing new are left exactly as they were.
fn merge_witnesses(
    existing: &WitnessSet,
    witnesses: &[PathWitness],
    sets: SetEncoding,
) -> Result<WitnessSet, AssemblyError> {
    let mut merged = existing.clone();

    for category in [witness_keys::VKEY_WITNESSES, witness_keys::BOOTSTRAP_WITNESSES] {
        let fresh: Vec<CborValue> = witnesses
            .iter()
            .filter(|w| w.witness.category() == category)
            .map(|w| w.witness.to_cbor_value())
            .collect();
        if fresh.is_empty() {
            continue;
        }

        let existing = match merged.entries.get(&category) {
            None => Some((Vec::new(), sets == SetEncoding::Tagged)),
            Some(value) => witness_list(value),
        };
        let Some((mut items, tagged)) = existing else {
            log_warn!(MODULE, "Existing witness entry is not a list", category = category);
            return Err(AssemblyError::MalformedWitnessSet(category));
        };

        for value in fresh {
            if !items.contains(&value) {
                items.push(value);
            }
        }

        let array = CborValue::Array(items);
        let value = if tagged {
            CborValue::tagged(TAG_SET, array)
        } else {
            array
        };
        merged.entries.insert(category, value);
    }

    Ok(merged)
}

/// Items of an existing witness category and whether it was a tagged set
fn witness_list(value: &CborValue) -> Option<(Vec<CborValue>, bool)> {
    match value {
        CborValue::Array(items) => Some((items.clone(), false)),
        CborValue::Tag(TAG_SET, inner) => inner.as_array().map(|items| (items.to_vec(), true)),
        _ => None,
    }
}
