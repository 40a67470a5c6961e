//! Hardware Signing Descriptors
//!
//! Public metadata for one key held on the device: its role, derivation path
//! and 64-byte extended public key (Ed25519 key ‖ chain code). No private key
//! material ever reaches the host.

use super::path::{DerivationPath, PathError};
use crate::codec::{self, key_hash, CborValue, Hash28};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an extended public key
pub const XPUB_LEN: usize = 64;

/// What a key is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyRole {
    Payment,
    Stake,
    DRep,
    CommitteeCold,
    CommitteeHot,
    PoolCold,
    Mint,
    MultiSig,
    Cip36Voting,
}

impl KeyRole {
    /// Prefix of the `type` field in hw-signing records
    pub fn record_prefix(&self) -> &'static str {
        match self {
            KeyRole::Payment => "Payment",
            KeyRole::Stake => "Stake",
            KeyRole::DRep => "DRep",
            KeyRole::CommitteeCold => "CommitteeCold",
            KeyRole::CommitteeHot => "CommitteeHot",
            KeyRole::PoolCold => "StakePool",
            KeyRole::Mint => "Mint",
            KeyRole::MultiSig => "MultiSig",
            KeyRole::Cip36Voting => "CIP36Vote",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("extended public key must be {XPUB_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("path {path} does not belong to a {role} key")]
    RoleMismatch { role: KeyRole, path: String },

    #[error("path {0} does not map to any known key role")]
    UnrecognizedPath(String),

    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("invalid hw-signing record: {0}")]
    InvalidRecord(String),
}

/// A key held on the hardware device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwSigningDescriptor {
    role: KeyRole,
    path: DerivationPath,
    extended_public_key: [u8; XPUB_LEN],
}

impl HwSigningDescriptor {
    pub fn new(
        role: KeyRole,
        path: DerivationPath,
        extended_public_key: &[u8],
    ) -> Result<Self, DescriptorError> {
        let extended_public_key: [u8; XPUB_LEN] = extended_public_key
            .try_into()
            .map_err(|_| DescriptorError::InvalidKeyLength(extended_public_key.len()))?;

        match path.implied_role() {
            Some(implied) if implied == role => {}
            Some(_) => {
                return Err(DescriptorError::RoleMismatch {
                    role,
                    path: path.to_string(),
                })
            }
            None => return Err(DescriptorError::UnrecognizedPath(path.to_string())),
        }

        Ok(Self {
            role,
            path,
            extended_public_key,
        })
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    pub fn extended_public_key(&self) -> &[u8; XPUB_LEN] {
        &self.extended_public_key
    }

    pub fn public_key(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&self.extended_public_key[..32]);
        key
    }

    pub fn chain_code(&self) -> [u8; 32] {
        let mut code = [0u8; 32];
        code.copy_from_slice(&self.extended_public_key[32..]);
        code
    }

    /// BLAKE2b-224 of the public key, i.e. the key's credential hash
    pub fn key_hash(&self) -> Hash28 {
        key_hash(&self.public_key())
    }

    /// Load from a hw-signing record; the role follows from the path
    pub fn from_record(record: &HwSigningRecord) -> Result<Self, DescriptorError> {
        let path = DerivationPath::parse(&record.path)?;
        let role = path
            .implied_role()
            .ok_or_else(|| DescriptorError::UnrecognizedPath(path.to_string()))?;

        let raw = hex::decode(record.cbor_xpub_hex.trim())
            .map_err(|e| DescriptorError::InvalidRecord(format!("cborXPubKeyHex: {}", e)))?;
        let xpub = match codec::decode(&raw) {
            Ok(CborValue::Bytes(bytes)) => bytes,
            Ok(other) => {
                return Err(DescriptorError::InvalidRecord(format!(
                    "cborXPubKeyHex must encode bytes, found {}",
                    other.kind()
                )))
            }
            Err(e) => return Err(DescriptorError::InvalidRecord(e.to_string())),
        };

        Self::new(role, path, &xpub)
    }

    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        let record: HwSigningRecord = serde_json::from_str(json)
            .map_err(|e| DescriptorError::InvalidRecord(e.to_string()))?;
        Self::from_record(&record)
    }

    pub fn to_record(&self, description: impl Into<String>) -> HwSigningRecord {
        let cbor = codec::encode_canonical(&CborValue::from(&self.extended_public_key[..]));
        HwSigningRecord {
            record_type: format!("{}HWSigningFileShelley_ed25519", self.role.record_prefix()),
            description: description.into(),
            path: self.path.to_string(),
            cbor_xpub_hex: hex::encode(cbor),
        }
    }
}

/// On-disk JSON form of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwSigningRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub description: String,
    pub path: String,
    #[serde(rename = "cborXPubKeyHex")]
    pub cbor_xpub_hex: String,
}
