//! Unified error type
//!
//! Component errors stay typed inside their modules. At the crate boundary
//! they collapse into one serializable `HwSignError` so a caller can present
//! any failure the same way.

use crate::codec::CodecError;
use crate::signing::{
    AssemblyError, ClassificationError, DescriptorError, DeviceError, PathError, PolicyError,
    SignFlowError,
};
use crate::tx::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all signing operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HwSignError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl HwSignError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for HwSignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for HwSignError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidCbor,
    InvalidTransaction,
    InvalidSigningFile,

    // Signing errors
    ClassificationFailed,
    PolicyViolation,
    DeviceError,
    AssemblyFailed,
    SerializationMismatch,
}

/// Result type alias for signing operations
pub type HwSignResult<T> = Result<T, HwSignError>;

// Conversions from component error types

impl From<CodecError> for HwSignError {
    fn from(e: CodecError) -> Self {
        HwSignError::new(ErrorCode::InvalidCbor, e.to_string())
    }
}

impl From<DecodeError> for HwSignError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Codec(inner) => inner.into(),
            other => HwSignError::new(ErrorCode::InvalidTransaction, other.to_string()),
        }
    }
}

impl From<PathError> for HwSignError {
    fn from(e: PathError) -> Self {
        HwSignError::new(ErrorCode::InvalidSigningFile, e.to_string())
    }
}

impl From<DescriptorError> for HwSignError {
    fn from(e: DescriptorError) -> Self {
        HwSignError::new(ErrorCode::InvalidSigningFile, e.to_string())
    }
}

impl From<ClassificationError> for HwSignError {
    fn from(e: ClassificationError) -> Self {
        HwSignError::new(ErrorCode::ClassificationFailed, e.to_string())
    }
}

impl From<PolicyError> for HwSignError {
    fn from(e: PolicyError) -> Self {
        HwSignError::new(ErrorCode::PolicyViolation, e.to_string()).with_details(format!("{:?}", e))
    }
}

impl From<DeviceError> for HwSignError {
    fn from(e: DeviceError) -> Self {
        HwSignError::new(ErrorCode::DeviceError, e.to_string())
    }
}

impl From<AssemblyError> for HwSignError {
    fn from(e: AssemblyError) -> Self {
        let code = match e {
            AssemblyError::SerializationMismatch { .. } => ErrorCode::SerializationMismatch,
            _ => ErrorCode::AssemblyFailed,
        };
        HwSignError::new(code, e.to_string())
    }
}

impl From<SignFlowError> for HwSignError {
    fn from(e: SignFlowError) -> Self {
        match e {
            SignFlowError::Classification(inner) => inner.into(),
            SignFlowError::Policy(inner) => inner.into(),
            SignFlowError::Device(inner) => inner.into(),
            SignFlowError::Assembly(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err: HwSignError = PolicyError::MissingStakeSigningFile.into();
        assert_eq!(err.code, ErrorCode::PolicyViolation);
        assert_eq!(err.details.as_deref(), Some("MissingStakeSigningFile"));

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("policy_violation"));
        assert!(json.contains("stake signing file"));
    }

    #[test]
    fn test_mismatch_has_own_code() {
        let err: HwSignError = SignFlowError::Assembly(AssemblyError::SerializationMismatch {
            host: "aa".to_string(),
            device: "bb".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::SerializationMismatch);
        assert!(err.to_string().starts_with("[SerializationMismatch]"));
    }

    #[test]
    fn test_codec_errors_unwrap() {
        let err: HwSignError = DecodeError::Codec(CodecError::Truncated).into();
        assert_eq!(err.code, ErrorCode::InvalidCbor);
        let err: HwSignError = DecodeError::UnsupportedCertificateType(9).into();
        assert_eq!(err.code, ErrorCode::InvalidTransaction);
    }

    #[test]
    fn test_component_error_codes() {
        let cases: Vec<(HwSignError, ErrorCode)> = vec![
            (DescriptorError::InvalidKeyLength(32).into(), ErrorCode::InvalidSigningFile),
            (ClassificationError::OwnerStakeKeyCount(2).into(), ErrorCode::ClassificationFailed),
            (DeviceError::Rejected("declined".to_string()).into(), ErrorCode::DeviceError),
            (AssemblyError::MalformedWitnessSet(0).into(), ErrorCode::AssemblyFailed),
        ];
        for (err, code) in cases {
            assert_eq!(err.code, code, "{}", err);
            assert!(err.details.is_none());
        }
    }
}
