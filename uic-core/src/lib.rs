//! Core types and utilities for UIC railway barcodes
//!
//! This crate provides the error taxonomy and the bit-addressable buffer
//! used throughout the UIC barcode implementation.

pub mod bit_buffer;
pub mod error;

pub use bit_buffer::BitBuffer;
pub use error::{ResultExt, UicError, UicResult};
