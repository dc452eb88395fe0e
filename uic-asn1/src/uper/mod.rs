//! UPER (Unaligned Packed Encoding Rules) encoder and decoder for ASN.1
//!
//! All UIC barcode payloads are encoded with the unaligned variant of the
//! Packed Encoding Rules (ITU-T X.691). Values are written in the minimum
//! number of bits with no padding between fields.
//!
//! # UPER Encoding Overview
//!
//! ## Integers
//! - **Constrained** `(min..max)`: `value - min` in `ceil(log2(max - min + 1))`
//!   bits, zero bits when `min == max`
//! - **Semi-constrained** `(min..MAX)`: length determinant + minimal unsigned
//!   octets of `value - min`
//! - **Unconstrained**: length determinant + minimal two's complement octets
//!
//! ## Length Determinant
//! - **Short form** (1 byte): lengths 0-127, top bit clear
//! - **Long form** (2 bytes): lengths 128-16383, prefix `10`
//!
//! Size-constrained types carry their length as a constrained whole number
//! instead, and fixed sizes carry none at all.
//!
//! ## SEQUENCE
//! ```text
//! [extension bit] [presence bitmap] [root fields...] [extension additions]
//! ```
//! The presence bitmap has one bit per OPTIONAL or DEFAULT field, in
//! declaration order.
//!
//! ## CHOICE / ENUMERATED
//! ```text
//! [extension bit] [index as constrained whole number over 0..root_count-1]
//! ```
//! When the extension bit is set, the index is a normally small number
//! counting from the first extension alternative.
//!
//! # Implementation Notes
//!
//! 1. Fragmented lengths (> 16383) are rejected; no barcode comes near them.
//! 2. Permitted-alphabet constraints on strings are not applied; IA5String
//!    always uses 7 bits per character.
//! 3. The encoder never emits SEQUENCE extension additions, the decoder skips
//!    them via [`UperDecoder::skip_sequence_extensions`].

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::UperDecoder;
pub use encoder::UperEncoder;
pub use types::SizeConstraint;
