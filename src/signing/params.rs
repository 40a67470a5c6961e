//! Signing Parameters
//!
//! Everything one signing operation needs, built once and read by the
//! validator, the device session and the assembler.

use super::descriptor::HwSigningDescriptor;
use super::path::DerivationPath;
use super::mode::{classify, ClassificationError, SigningMode};
use crate::codec::Hash32;
use crate::tx::Transaction;
use crate::types::{Era, Network};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full signature or a single detached witness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningPurpose {
    Sign,
    Witness,
}

impl fmt::Display for SigningPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningPurpose::Sign => f.write_str("sign"),
            SigningPurpose::Witness => f.write_str("witness"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SigningParameters<'a> {
    pub mode: SigningMode,
    pub purpose: SigningPurpose,
    pub transaction: &'a Transaction,
    /// Hash of the canonical body, the value the device signs
    pub body_hash: Hash32,
    pub descriptors: &'a [HwSigningDescriptor],
    pub network: Network,
    pub era: Era,
}

impl<'a> SigningParameters<'a> {
    /// Classify the transaction and capture the derived values
    pub fn prepare(
        transaction: &'a Transaction,
        descriptors: &'a [HwSigningDescriptor],
        purpose: SigningPurpose,
        network: Network,
    ) -> Result<Self, ClassificationError> {
        let mode = classify(&transaction.body, descriptors)?;
        Ok(Self {
            mode,
            purpose,
            transaction,
            body_hash: transaction.canonical_body_hash(),
            descriptors,
            network,
            era: transaction.era(),
        })
    }

    /// Descriptor whose path matches exactly
    pub fn descriptor_for(&self, path: &DerivationPath) -> Option<&'a HwSigningDescriptor> {
        self.descriptors.iter().find(|d| d.path() == path)
    }
}
