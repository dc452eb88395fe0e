//! Frame layer for UIC railway barcodes
//!
//! This crate provides the three barcode containers:
//!
//! - [`static_frame`]: the legacy `#UT` frame with zlib-compressed records
//! - [`dynamic_frame`]: the two-level signed UPER frame (`U1`/`U2`)
//! - [`ssb`]: the fixed 114-byte Small Structured Barcode
//!
//! Every frame decodes into plain data and encodes back to the same bytes.
//! Signing and verification go through the capabilities in `uic_security`.

pub mod compression;
pub mod config;
pub mod dynamic_frame;
pub mod ssb;
pub mod static_frame;

#[cfg(test)]
mod test_support;

pub use compression::{Compressor, ZlibCompressor};
pub use config::{DynamicFormat, FrameConfig, StaticVersion};
pub use dynamic_frame::{DataBlock, DataContent, DynamicContent, DynamicFrame, Level1Data, Level2Data};
pub use ssb::{SsbFrame, SsbHeader, SsbTicket};
pub use static_frame::{DataRecord, StaticFrame};
