//! Signing Flow
//!
//! classify → validate → device → assemble. Nothing is produced unless
//! every step succeeds.

use super::descriptor::HwSigningDescriptor;
use super::device::{DeviceError, DeviceSession};
use super::mode::ClassificationError;
use super::params::{SigningParameters, SigningPurpose};
use super::policy::{validate, PolicyError};
use super::witness::{assemble, AssemblyError, SignedOutput};
use crate::tx::Transaction;
use crate::types::Network;
use crate::{log_error, log_info};

const MODULE: &str = "signing";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignFlowError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Sign or witness `transaction` with the keys in `descriptors`
pub async fn sign_with_device<S>(
    session: &S,
    transaction: &Transaction,
    descriptors: &[HwSigningDescriptor],
    purpose: SigningPurpose,
    network: Network,
) -> Result<SignedOutput, SignFlowError>
where
    S: DeviceSession + ?Sized,
{
    let params = SigningParameters::prepare(transaction, descriptors, purpose, network)?;
    log_info!(
        MODULE,
        "Signing parameters prepared",
        mode = params.mode,
        purpose = purpose,
        era = params.era,
        body_hash = hex::encode(params.body_hash),
        signing_files = descriptors.len()
    );

    validate(&params)?;

    let response = session.sign(&params).await.map_err(|e| {
        log_error!(MODULE, "Device session failed", error = e);
        e
    })?;

    let output = assemble(&params, &response)?;
    log_info!(
        MODULE,
        "Signing complete",
        envelope = output.envelope_type(),
        bytes = output.cbor.len()
    );
    Ok(output)
}
