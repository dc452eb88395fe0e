//! UIC railway barcode codec
//!
//! Reads and writes the barcode containers printed on European rail tickets
//! and verifies their signatures.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `uic-core`: error type and bit buffer
//! - `uic-asn1`: ASN.1 UPER encoder and decoder
//! - `uic-security`: signature algorithms, `ring`-backed signer and verifier
//! - `uic-ticket`: FCB ticket payload boundary
//! - `uic-frame`: Static, Dynamic and SSB frames
//!
//! # Usage
//!
//! ```no_run
//! use uic::decode_barcode;
//!
//! # fn scanned() -> Vec<u8> { Vec::new() }
//! let barcode = decode_barcode(&scanned())?;
//! for ticket in barcode.ticket_payloads()? {
//!     println!("{} ticket, {} bytes", ticket.format(), ticket.bytes.len());
//! }
//! # Ok::<(), uic::UicError>(())
//! ```

mod barcode;
mod builder;

pub use barcode::{decode_barcode, decode_barcode_with_config, detect, Barcode, BarcodeKind};
pub use builder::BarcodeBuilder;

// Re-export core types
pub use uic_core::{UicError, UicResult};
pub use uic_frame::{DynamicFormat, FrameConfig, StaticVersion};
pub use uic_security::SignatureValidation;
pub use uic_ticket::{FcbVersion, OpaqueTicketCodec, TicketCodec, TicketPayload};

// Re-export frame codecs
pub mod frame {
    pub use uic_frame::*;
}

// Re-export signature capabilities
pub mod security {
    pub use uic_security::*;
}

// Re-export the FCB boundary
pub mod ticket {
    pub use uic_ticket::*;
}

// Re-export the UPER codec
pub mod asn1 {
    pub use uic_asn1::*;
}
