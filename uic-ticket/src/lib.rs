//! Ticket payload boundary for UIC barcodes
//!
//! Frames carry Flexible Content Barcode (FCB) ticket data as UPER-encoded
//! bytes tagged with a format name such as `FCB3`. This crate names those
//! versions and defines the [`TicketCodec`] seam behind which a full FCB data
//! model can be plugged in. Without one, [`OpaqueTicketCodec`] keeps the
//! payload bytes untouched so frames still round-trip exactly.

pub mod codec;
pub mod version;

pub use codec::{decode_payload, OpaqueTicketCodec, TicketCodec, TicketPayload};
pub use version::FcbVersion;
