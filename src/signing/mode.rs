//! Signing-Mode Classifier
//!
//! Maps a transaction body and the supplied descriptors onto exactly one
//! signing mode. Precedence, highest first:
//! 1. pool registration certificate (operator or owner)
//! 2. script execution evidence
//! 3. any multisig descriptor
//! 4. ordinary

use super::descriptor::{HwSigningDescriptor, KeyRole};
use crate::tx::TransactionBody;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningMode {
    Ordinary,
    PoolRegistrationAsOwner,
    PoolRegistrationAsOperator,
    Multisig,
    Plutus,
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("transaction contains {0} pool registration certificates, at most one is allowed")]
    MultiplePoolRegistrations(usize),

    #[error("pool registration as owner needs exactly one stake signing file, got {0}")]
    OwnerStakeKeyCount(usize),

    #[error("stake signing file does not match any pool owner")]
    OwnerNotInCertificate,
}

pub fn classify(
    body: &TransactionBody,
    descriptors: &[HwSigningDescriptor],
) -> Result<SigningMode, ClassificationError> {
    let pools: Vec<_> = body.pool_registrations().collect();
    if pools.len() > 1 {
        return Err(ClassificationError::MultiplePoolRegistrations(pools.len()));
    }

    if let Some(pool) = pools.first() {
        if has_role(descriptors, KeyRole::PoolCold) {
            return Ok(SigningMode::PoolRegistrationAsOperator);
        }

        let stake: Vec<_> = with_role(descriptors, KeyRole::Stake).collect();
        if stake.len() != 1 {
            return Err(ClassificationError::OwnerStakeKeyCount(stake.len()));
        }
        let owner_hash = stake[0].key_hash();
        if !pool.owners.contains(&owner_hash) {
            return Err(ClassificationError::OwnerNotInCertificate);
        }
        return Ok(SigningMode::PoolRegistrationAsOwner);
    }

    if body.has_script_evidence() {
        return Ok(SigningMode::Plutus);
    }

    if has_role(descriptors, KeyRole::MultiSig) {
        return Ok(SigningMode::Multisig);
    }

    Ok(SigningMode::Ordinary)
}

pub(crate) fn with_role(
    descriptors: &[HwSigningDescriptor],
    role: KeyRole,
) -> impl Iterator<Item = &HwSigningDescriptor> {
    descriptors.iter().filter(move |d| d.role() == role)
}

fn has_role(descriptors: &[HwSigningDescriptor], role: KeyRole) -> bool {
    with_role(descriptors, role).next().is_some()
}
