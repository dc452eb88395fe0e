//! ASN.1 processing module for UIC railway barcodes
//!
//! This crate provides the UPER codec every barcode container is built on:
//! a symmetric encoder/decoder pair over [`uic_core::BitBuffer`].

pub mod uper;

pub use uic_core::{UicError, UicResult};
pub use uper::types::{oid_from_bytes, oid_to_bytes};
pub use uper::{SizeConstraint, UperDecoder, UperEncoder};
