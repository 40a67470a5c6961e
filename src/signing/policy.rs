//! Policy Validator
//!
//! Cardinality rules over the descriptor set, checked before the device is
//! ever contacted. Global preconditions run first, then the rules of the
//! classified mode.
//!
//! | Mode     | Payment        | Stake              | PoolCold          | Mint            | MultiSig  |
//! |----------|----------------|--------------------|-------------------|-----------------|-----------|
//! | Ordinary | sign: ≥ 1      | iff stake content  | iff retirement    | iff minting     | forbidden |
//! | Owner    | forbidden      | exactly 1          | forbidden         | forbidden       | forbidden |
//! | Operator | forbidden      | forbidden          | exactly 1         | forbidden       | forbidden |
//! | Multisig | forbidden      | forbidden          | forbidden         | iff minting     | any       |
//! | Plutus   | any            | any                | forbidden         | any             | any       |

use super::descriptor::{HwSigningDescriptor, KeyRole};
use super::mode::{with_role, SigningMode};
use super::params::{SigningParameters, SigningPurpose};
use crate::tx::TransactionBody;
use crate::log_warn;
use std::collections::BTreeSet;

const MODULE: &str = "policy";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("transaction has no inputs")]
    MissingInputs,

    #[error("no hw signing files supplied")]
    NoSigningFiles,

    #[error("signing file for path {0} supplied more than once")]
    DuplicateSigningFile(String),

    #[error("a witness operation takes exactly one signing file, got {0}")]
    TooManyWitnessSigningFiles(usize),

    #[error("transaction body is not canonically encoded, transform it before signing")]
    NonCanonicalBody,

    #[error("transaction network id {body} does not match target network id {network}")]
    NetworkIdMismatch { body: u8, network: u8 },

    #[error("at least one payment signing file is required")]
    MissingPaymentSigningFile,

    #[error("payment signing files are not allowed in this signing mode")]
    UnexpectedPaymentSigningFile,

    #[error("payment signing files are not allowed with a pool registration certificate")]
    TooManyPaymentFilesWithPoolReg,

    #[error("a stake signing file is required")]
    MissingStakeSigningFile,

    #[error("at most one stake signing file is allowed, got {0}")]
    TooManyStakeSigningFiles(usize),

    #[error("stake signing file supplied but not needed")]
    UnexpectedStakeSigningFile,

    #[error("a pool cold signing file is required")]
    MissingPoolColdSigningFile,

    #[error("at most one pool cold signing file is allowed, got {0}")]
    TooManyPoolColdSigningFiles(usize),

    #[error("pool cold signing file supplied but not needed")]
    UnexpectedPoolColdSigningFile,

    #[error("mint signing file supplied but the transaction does not mint")]
    UnexpectedMintSigningFile,

    #[error("multisig signing files are not allowed in this signing mode")]
    UnexpectedMultisigSigningFile,
}

/// Descriptors per role
struct RoleCounts {
    payment: usize,
    stake: usize,
    pool_cold: usize,
    mint: usize,
    multisig: usize,
}

impl RoleCounts {
    fn of(descriptors: &[HwSigningDescriptor]) -> Self {
        let count = |role| with_role(descriptors, role).count();
        Self {
            payment: count(KeyRole::Payment),
            stake: count(KeyRole::Stake),
            pool_cold: count(KeyRole::PoolCold),
            mint: count(KeyRole::Mint),
            multisig: count(KeyRole::MultiSig),
        }
    }
}

pub fn validate(params: &SigningParameters<'_>) -> Result<(), PolicyError> {
    let result = check_global(params).and_then(|()| {
        let body = &params.transaction.body;
        let counts = RoleCounts::of(params.descriptors);
        match params.mode {
            SigningMode::Ordinary => check_ordinary(body, &counts, params.purpose),
            SigningMode::PoolRegistrationAsOwner => check_pool_owner(&counts),
            SigningMode::PoolRegistrationAsOperator => check_pool_operator(&counts),
            SigningMode::Multisig => check_multisig(body, &counts),
            SigningMode::Plutus => check_plutus(&counts),
        }
    });

    if let Err(ref e) = result {
        log_warn!(
            MODULE,
            "Signing request rejected",
            mode = params.mode,
            purpose = params.purpose,
            reason = e
        );
    }
    result
}

fn check_global(params: &SigningParameters<'_>) -> Result<(), PolicyError> {
    let tx = params.transaction;
    if tx.body.inputs.is_empty() {
        return Err(PolicyError::MissingInputs);
    }
    if params.descriptors.is_empty() {
        return Err(PolicyError::NoSigningFiles);
    }

    let mut paths = BTreeSet::new();
    for descriptor in params.descriptors {
        if !paths.insert(descriptor.path()) {
            return Err(PolicyError::DuplicateSigningFile(descriptor.path().to_string()));
        }
    }

    if params.purpose == SigningPurpose::Witness && params.descriptors.len() > 1 {
        return Err(PolicyError::TooManyWitnessSigningFiles(params.descriptors.len()));
    }
    if !tx.is_canonical() {
        return Err(PolicyError::NonCanonicalBody);
    }
    if let Some(body_network) = tx.body.network_id {
        if body_network != params.network.network_id {
            return Err(PolicyError::NetworkIdMismatch {
                body: body_network,
                network: params.network.network_id,
            });
        }
    }
    Ok(())
}

fn check_ordinary(
    body: &TransactionBody,
    counts: &RoleCounts,
    purpose: SigningPurpose,
) -> Result<(), PolicyError> {
    if purpose == SigningPurpose::Sign && counts.payment == 0 {
        return Err(PolicyError::MissingPaymentSigningFile);
    }

    if body.has_stake_witness_content() {
        if purpose == SigningPurpose::Sign && counts.stake == 0 {
            return Err(PolicyError::MissingStakeSigningFile);
        }
        if counts.stake > 1 {
            return Err(PolicyError::TooManyStakeSigningFiles(counts.stake));
        }
    } else if counts.stake > 0 {
        return Err(PolicyError::UnexpectedStakeSigningFile);
    }

    if body.has_pool_retirement() {
        if purpose == SigningPurpose::Sign && counts.pool_cold == 0 {
            return Err(PolicyError::MissingPoolColdSigningFile);
        }
        if counts.pool_cold > 1 {
            return Err(PolicyError::TooManyPoolColdSigningFiles(counts.pool_cold));
        }
    } else if counts.pool_cold > 0 {
        return Err(PolicyError::UnexpectedPoolColdSigningFile);
    }

    if counts.mint > 0 && !body.mints() {
        return Err(PolicyError::UnexpectedMintSigningFile);
    }
    if counts.multisig > 0 {
        return Err(PolicyError::UnexpectedMultisigSigningFile);
    }
    Ok(())
}

fn check_pool_owner(counts: &RoleCounts) -> Result<(), PolicyError> {
    if counts.payment > 0 {
        return Err(PolicyError::TooManyPaymentFilesWithPoolReg);
    }
    match counts.stake {
        0 => return Err(PolicyError::MissingStakeSigningFile),
        1 => {}
        n => return Err(PolicyError::TooManyStakeSigningFiles(n)),
    }
    if counts.pool_cold > 0 {
        return Err(PolicyError::UnexpectedPoolColdSigningFile);
    }
    if counts.mint > 0 {
        return Err(PolicyError::UnexpectedMintSigningFile);
    }
    if counts.multisig > 0 {
        return Err(PolicyError::UnexpectedMultisigSigningFile);
    }
    Ok(())
}

fn check_pool_operator(counts: &RoleCounts) -> Result<(), PolicyError> {
    if counts.payment > 0 {
        return Err(PolicyError::TooManyPaymentFilesWithPoolReg);
    }
    if counts.stake > 0 {
        return Err(PolicyError::UnexpectedStakeSigningFile);
    }
    match counts.pool_cold {
        0 => return Err(PolicyError::MissingPoolColdSigningFile),
        1 => {}
        n => return Err(PolicyError::TooManyPoolColdSigningFiles(n)),
    }
    if counts.mint > 0 {
        return Err(PolicyError::UnexpectedMintSigningFile);
    }
    if counts.multisig > 0 {
        return Err(PolicyError::UnexpectedMultisigSigningFile);
    }
    Ok(())
}

fn check_multisig(body: &TransactionBody, counts: &RoleCounts) -> Result<(), PolicyError> {
    if counts.payment > 0 {
        return Err(PolicyError::UnexpectedPaymentSigningFile);
    }
    if counts.stake > 0 {
        return Err(PolicyError::UnexpectedStakeSigningFile);
    }
    if counts.pool_cold > 0 {
        return Err(PolicyError::UnexpectedPoolColdSigningFile);
    }
    if counts.mint > 0 && !body.mints() {
        return Err(PolicyError::UnexpectedMintSigningFile);
    }
    Ok(())
}

fn check_plutus(counts: &RoleCounts) -> Result<(), PolicyError> {
    if counts.pool_cold > 0 {
        return Err(PolicyError::UnexpectedPoolColdSigningFile);
    }
    Ok(())
}
