//! Outcome of a signature check

use std::fmt;

/// Result of validating one signature level of a frame
///
/// Validation never fails with an error; every problem maps onto one of
/// these outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureValidation {
    Valid,
    /// Signature present but does not match the signed data
    InvalidSignature,
    /// No public key available for this level
    KeyMissing,
    SignatureMissing,
    SignedDataMissing,
    /// Signing algorithm absent or not supported by the verifier
    AlgorithmMissing,
    /// Key or signature could not be decoded
    EncodingError,
}

impl SignatureValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, SignatureValidation::Valid)
    }

    /// Map the outcome of a verifier call
    pub fn from_verification(result: uic_core::UicResult<bool>) -> Self {
        use uic_core::UicError;
        match result {
            Ok(true) => SignatureValidation::Valid,
            Ok(false) => SignatureValidation::InvalidSignature,
            Err(e) => match e.root_cause() {
                UicError::UnsupportedAlgorithm(_) => SignatureValidation::AlgorithmMissing,
                UicError::InvalidSignature(_) => SignatureValidation::InvalidSignature,
                _ => SignatureValidation::EncodingError,
            },
        }
    }
}

impl fmt::Display for SignatureValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignatureValidation::Valid => "valid",
            SignatureValidation::InvalidSignature => "invalid signature",
            SignatureValidation::KeyMissing => "key missing",
            SignatureValidation::SignatureMissing => "signature missing",
            SignatureValidation::SignedDataMissing => "signed data missing",
            SignatureValidation::AlgorithmMissing => "algorithm missing",
            SignatureValidation::EncodingError => "encoding error",
        };
        f.write_str(text)
    }
}
