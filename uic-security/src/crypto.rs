//! Signing and verification capabilities
//!
//! Frame codecs never touch key material directly. They hand the exact bytes
//! to be signed to a [`Signer`] and the signature, data and key to a
//! [`SignatureVerifier`]. Signatures cross these seams in DER form; frames
//! that store raw `r ‖ s` convert with [`crate::der`].
//!
//! [`RingSigner`] and [`RingVerifier`] implement the capabilities with `ring`
//! for ECDSA P-256 and P-384. Other recognised algorithms are reported as
//! [`UicError::UnsupportedAlgorithm`].

use crate::algorithm::SignatureAlgorithm;
use crate::der;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair, UnparsedPublicKey};
use uic_core::{UicError, UicResult};

/// Produces signatures over barcode data
#[cfg_attr(test, mockall::automock)]
pub trait Signer {
    /// Sign `data`, returning a DER `SEQUENCE { r, s }` signature
    fn sign(&self, data: &[u8]) -> UicResult<Vec<u8>>;

    /// OID of the signature algorithm this signer uses
    fn algorithm_oid(&self) -> String;
}

/// Checks signatures over barcode data
#[cfg_attr(test, mockall::automock)]
pub trait SignatureVerifier {
    /// Verify a DER signature over `data`
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match,
    /// and an error when the key or algorithm cannot be used at all.
    fn verify(
        &self,
        signature_der: &[u8],
        data: &[u8],
        public_key: &[u8],
        algorithm_oid: &str,
    ) -> UicResult<bool>;
}

fn signing_algorithm(algorithm: SignatureAlgorithm) -> UicResult<&'static EcdsaSigningAlgorithm> {
    match algorithm {
        SignatureAlgorithm::EcdsaP256Sha256 => Ok(&signature::ECDSA_P256_SHA256_ASN1_SIGNING),
        SignatureAlgorithm::EcdsaP384Sha384 => Ok(&signature::ECDSA_P384_SHA384_ASN1_SIGNING),
        other => Err(UicError::UnsupportedAlgorithm(format!(
            "No signing backend for {:?} ({})",
            other,
            other.oid()
        ))),
    }
}

/// ECDSA signer backed by a `ring` key pair
pub struct RingSigner {
    key_pair: EcdsaKeyPair,
    algorithm: SignatureAlgorithm,
    rng: SystemRandom,
}

impl RingSigner {
    /// Load a signer from a PKCS#8 v1 private key document
    pub fn from_pkcs8(algorithm: SignatureAlgorithm, pkcs8: &[u8]) -> UicResult<Self> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(signing_algorithm(algorithm)?, pkcs8, &rng)
            .map_err(|e| UicError::MalformedKey(format!("Rejected PKCS#8 key: {}", e)))?;
        Ok(Self {
            key_pair,
            algorithm,
            rng,
        })
    }

    /// Generate a fresh key pair
    ///
    /// Returns the signer and its PKCS#8 document so the key can be stored.
    pub fn generate(algorithm: SignatureAlgorithm) -> UicResult<(Self, Vec<u8>)> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing_algorithm(algorithm)?, &rng)
            .map_err(|_| UicError::Security("Key generation failed".to_string()))?;
        let signer = Self::from_pkcs8(algorithm, pkcs8.as_ref())?;
        Ok((signer, pkcs8.as_ref().to_vec()))
    }

    /// Uncompressed SEC1 public key point
    pub fn public_key(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }
}

impl Signer for RingSigner {
    fn sign(&self, data: &[u8]) -> UicResult<Vec<u8>> {
        let signature = self
            .key_pair
            .sign(&self.rng, data)
            .map_err(|_| UicError::Security("Signing failed".to_string()))?;
        log::trace!(
            "Signed {} bytes with {}, signature {} bytes",
            data.len(),
            self.algorithm,
            signature.as_ref().len()
        );
        Ok(signature.as_ref().to_vec())
    }

    fn algorithm_oid(&self) -> String {
        self.algorithm.oid().to_string()
    }
}

/// ECDSA verifier backed by `ring`
///
/// Public keys may be given as an uncompressed SEC1 point or wrapped in an
/// X.509 `SubjectPublicKeyInfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingVerifier;

impl RingVerifier {
    pub fn new() -> Self {
        Self
    }

    fn sec1_point(public_key: &[u8], coordinate_len: usize) -> UicResult<Vec<u8>> {
        let point = match public_key.first() {
            Some(0x30) => der::subject_public_key(public_key)?,
            Some(_) => public_key.to_vec(),
            None => return Err(UicError::MalformedKey("Empty public key".to_string())),
        };
        if point.first() != Some(&0x04) || point.len() != 1 + 2 * coordinate_len {
            return Err(UicError::MalformedKey(format!(
                "Expected uncompressed point of {} bytes, got {} bytes",
                1 + 2 * coordinate_len,
                point.len()
            )));
        }
        Ok(point)
    }
}

impl SignatureVerifier for RingVerifier {
    fn verify(
        &self,
        signature_der: &[u8],
        data: &[u8],
        public_key: &[u8],
        algorithm_oid: &str,
    ) -> UicResult<bool> {
        let algorithm = SignatureAlgorithm::from_oid(algorithm_oid)?;
        let verification: &'static dyn signature::VerificationAlgorithm = match algorithm {
            SignatureAlgorithm::EcdsaP256Sha256 => &signature::ECDSA_P256_SHA256_ASN1,
            SignatureAlgorithm::EcdsaP384Sha384 => &signature::ECDSA_P384_SHA384_ASN1,
            other => {
                return Err(UicError::UnsupportedAlgorithm(format!(
                    "No verification backend for {:?} ({})",
                    other, algorithm_oid
                )));
            }
        };
        let point = Self::sec1_point(public_key, algorithm.component_len())?;

        let valid = UnparsedPublicKey::new(verification, &point)
            .verify(data, signature_der)
            .is_ok();
        log::trace!(
            "Verified {} bytes with {}: {}",
            data.len(),
            algorithm,
            if valid { "valid" } else { "invalid" }
        );
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify_p256() {
        let (signer, _) = RingSigner::generate(SignatureAlgorithm::EcdsaP256Sha256).unwrap();
        let data = b"level 1 data";
        let signature = signer.sign(data).unwrap();

        let verifier = RingVerifier::new();
        let oid = signer.algorithm_oid();
        assert!(verifier.verify(&signature, data, &signer.public_key(), &oid).unwrap());
        assert!(!verifier.verify(&signature, b"tampered", &signer.public_key(), &oid).unwrap());
    }

    #[test]
    fn test_sign_and_verify_p384() {
        let (signer, pkcs8) = RingSigner::generate(SignatureAlgorithm::EcdsaP384Sha384).unwrap();
        let reloaded = RingSigner::from_pkcs8(SignatureAlgorithm::EcdsaP384Sha384, &pkcs8).unwrap();
        assert_eq!(signer.public_key(), reloaded.public_key());

        let signature = reloaded.sign(b"abc").unwrap();
        let valid = RingVerifier
            .verify(&signature, b"abc", &signer.public_key(), "1.2.840.10045.4.3.3")
            .unwrap();
        assert!(valid);
    }

    #[test]
    fn test_raw_signature_roundtrip_verifies() {
        let (signer, _) = RingSigner::generate(SignatureAlgorithm::EcdsaP256Sha256).unwrap();
        let signature = signer.sign(b"static frame").unwrap();
        let raw = der::signature_to_raw(&signature, 32).unwrap();
        assert_eq!(raw.len(), 64);

        let rebuilt = der::signature_from_raw(&raw).unwrap();
        assert!(RingVerifier
            .verify(&rebuilt, b"static frame", &signer.public_key(), "1.2.840.10045.4.3.2")
            .unwrap());
    }

    #[test]
    fn test_unsupported_algorithms() {
        assert!(matches!(
            RingSigner::generate(SignatureAlgorithm::DsaSha224),
            Err(UicError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            RingVerifier.verify(&[], b"", &[0x04; 133], "1.2.840.10045.4.3.4"),
            Err(UicError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            RingVerifier.verify(&[], b"", &[0x04; 65], "1.9.9"),
            Err(UicError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_malformed_key() {
        assert!(matches!(
            RingVerifier.verify(&[0x30, 0x00], b"", &[], "1.2.840.10045.4.3.2"),
            Err(UicError::MalformedKey(_))
        ));
        assert!(matches!(
            RingVerifier.verify(&[0x30, 0x00], b"", &[0x04, 0x01, 0x02], "1.2.840.10045.4.3.2"),
            Err(UicError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_mock_signer() {
        let mut signer = MockSigner::new();
        signer.expect_sign().returning(|data| Ok(data.to_vec()));
        signer
            .expect_algorithm_oid()
            .return_const("1.2.840.10045.4.3.2".to_string());
        assert_eq!(signer.sign(b"xy").unwrap(), b"xy".to_vec());
        assert_eq!(signer.algorithm_oid(), "1.2.840.10045.4.3.2");
    }
}
