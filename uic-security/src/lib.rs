//! Security module for UIC barcodes
//!
//! This crate provides the signature algorithm registry, conversions between
//! DER and raw `r ‖ s` signatures, and the signing/verification capabilities
//! the frame codecs are generic over.

pub mod algorithm;
pub mod crypto;
pub mod der;
pub mod validation;

pub use algorithm::{KeyAlgorithm, SignatureAlgorithm};
pub use crypto::{RingSigner, RingVerifier, SignatureVerifier, Signer};
pub use validation::SignatureValidation;
