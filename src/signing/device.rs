//! Device Session Boundary
//!
//! The hardware transport is an injected capability: one awaitable call per
//! signing operation, returning raw signatures keyed by derivation path.

use super::params::SigningParameters;
use super::path::DerivationPath;
use crate::codec::Hash32;
use async_trait::async_trait;

/// One signature produced by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignature {
    pub path: DerivationPath,
    pub signature: Vec<u8>,
}

impl DeviceSignature {
    pub fn new(path: DerivationPath, signature: impl Into<Vec<u8>>) -> Self {
        Self {
            path,
            signature: signature.into(),
        }
    }
}

/// Everything the device returned for one request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceResponse {
    pub signatures: Vec<DeviceSignature>,
    /// Body hash computed by the device, required for full signing
    pub body_hash: Option<Hash32>,
}

/// Failures reported by the transport; forwarded unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("device transport error: {0}")]
    Transport(String),

    #[error("operation rejected on device: {0}")]
    Rejected(String),

    #[error("device does not support this operation: {0}")]
    Unsupported(String),
}

#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Sign the validated transaction with every key in `params.descriptors`
    async fn sign(&self, params: &SigningParameters<'_>) -> Result<DeviceResponse, DeviceError>;
}
