//! Signature and key algorithm identifiers used in UIC barcodes

use std::fmt;
use uic_core::{UicError, UicResult};

/// Signature algorithm, identified in barcodes by its OID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-256 with SHA-256
    EcdsaP256Sha256,
    /// ECDSA over P-384 with SHA-384
    EcdsaP384Sha384,
    /// ECDSA over P-521 with SHA-512
    EcdsaP521Sha512,
    /// DSA with SHA-1 (legacy Static Frame v1)
    DsaSha1,
    /// DSA with SHA-224 (SSB)
    DsaSha224,
    /// DSA with SHA-256
    DsaSha256,
}

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 6] = [
        SignatureAlgorithm::EcdsaP256Sha256,
        SignatureAlgorithm::EcdsaP384Sha384,
        SignatureAlgorithm::EcdsaP521Sha512,
        SignatureAlgorithm::DsaSha1,
        SignatureAlgorithm::DsaSha224,
        SignatureAlgorithm::DsaSha256,
    ];

    /// Get the algorithm OID in dotted notation
    pub fn oid(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => "1.2.840.10045.4.3.2",
            SignatureAlgorithm::EcdsaP384Sha384 => "1.2.840.10045.4.3.3",
            SignatureAlgorithm::EcdsaP521Sha512 => "1.2.840.10045.4.3.4",
            SignatureAlgorithm::DsaSha1 => "1.2.840.10040.4.3",
            SignatureAlgorithm::DsaSha224 => "2.16.840.1.101.3.4.3.1",
            SignatureAlgorithm::DsaSha256 => "2.16.840.1.101.3.4.3.2",
        }
    }

    /// Get the algorithm from its OID
    pub fn from_oid(oid: &str) -> UicResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.oid() == oid)
            .ok_or_else(|| UicError::UnsupportedAlgorithm(oid.to_string()))
    }

    /// Byte length of each of `r` and `s` when stored as a raw fixed-width block
    pub fn component_len(&self) -> usize {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => 32,
            SignatureAlgorithm::EcdsaP384Sha384 => 48,
            SignatureAlgorithm::EcdsaP521Sha512 => 66,
            SignatureAlgorithm::DsaSha1 => 20,
            SignatureAlgorithm::DsaSha224 => 28,
            SignatureAlgorithm::DsaSha256 => 32,
        }
    }

    /// Check if this is an ECDSA algorithm
    pub fn is_ecdsa(&self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::EcdsaP256Sha256
                | SignatureAlgorithm::EcdsaP384Sha384
                | SignatureAlgorithm::EcdsaP521Sha512
        )
    }

    /// Key algorithm matching this signature algorithm
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => KeyAlgorithm::EcP256,
            SignatureAlgorithm::EcdsaP384Sha384 => KeyAlgorithm::EcP384,
            SignatureAlgorithm::EcdsaP521Sha512 => KeyAlgorithm::EcP521,
            SignatureAlgorithm::DsaSha1
            | SignatureAlgorithm::DsaSha224
            | SignatureAlgorithm::DsaSha256 => KeyAlgorithm::Dsa,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.oid())
    }
}

/// Public key algorithm, as carried in the Dynamic Frame key algorithm fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// prime256v1 / secp256r1
    EcP256,
    /// secp384r1
    EcP384,
    /// secp521r1
    EcP521,
    Dsa,
}

impl KeyAlgorithm {
    /// Get the key algorithm OID in dotted notation
    ///
    /// Elliptic-curve keys are identified by their named curve.
    pub fn oid(&self) -> &'static str {
        match self {
            KeyAlgorithm::EcP256 => "1.2.840.10045.3.1.7",
            KeyAlgorithm::EcP384 => "1.3.132.0.34",
            KeyAlgorithm::EcP521 => "1.3.132.0.35",
            KeyAlgorithm::Dsa => "1.2.840.10040.4.1",
        }
    }

    /// Get the key algorithm from its OID
    pub fn from_oid(oid: &str) -> UicResult<Self> {
        match oid {
            "1.2.840.10045.3.1.7" => Ok(KeyAlgorithm::EcP256),
            "1.3.132.0.34" => Ok(KeyAlgorithm::EcP384),
            "1.3.132.0.35" => Ok(KeyAlgorithm::EcP521),
            "1.2.840.10040.4.1" => Ok(KeyAlgorithm::Dsa),
            _ => Err(UicError::UnsupportedAlgorithm(oid.to_string())),
        }
    }
}
