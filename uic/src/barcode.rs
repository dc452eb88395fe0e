//! Frame type detection and decoding of scanned barcodes

use serde::{Deserialize, Serialize};
use uic_asn1::UperDecoder;
use uic_core::UicResult;
use uic_frame::ssb::SSB_LEN;
use uic_frame::static_frame::MAGIC;
use uic_frame::{DynamicFormat, DynamicFrame, FrameConfig, SsbFrame, StaticFrame};
use uic_security::{SignatureValidation, SignatureVerifier};
use uic_ticket::{OpaqueTicketCodec, TicketCodec, TicketPayload};

/// Container type of a barcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeKind {
    Static,
    Dynamic,
    Ssb,
}

/// Decoded barcode of any container type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Barcode {
    Static(StaticFrame),
    Dynamic(DynamicFrame),
    Ssb(SsbFrame),
}

/// Check whether `bytes` start like a Dynamic Frame header
fn has_dynamic_header(bytes: &[u8]) -> bool {
    let mut decoder = UperDecoder::new(bytes);
    let header = decoder
        .decode_sequence_extension_marker()
        .and_then(|_| decoder.decode_presence_bitmap(1))
        .and_then(|_| decoder.decode_length_determinant());
    if !matches!(header, Ok(2)) {
        return false;
    }
    let mut format = String::with_capacity(2);
    for _ in 0..2 {
        match decoder.decode_bits(7) {
            Ok(code) => format.push(char::from(code as u8)),
            Err(_) => return false,
        }
    }
    DynamicFormat::from_format(&format).is_ok()
}

/// Determine the container type of a scanned barcode
///
/// `#UT` marks a Static Frame. A 114-byte input is an SSB unless it starts
/// with a Dynamic Frame header. Everything else is read as a Dynamic Frame.
pub fn detect(bytes: &[u8]) -> BarcodeKind {
    if bytes.starts_with(MAGIC) {
        BarcodeKind::Static
    } else if bytes.len() == SSB_LEN && !has_dynamic_header(bytes) {
        BarcodeKind::Ssb
    } else {
        BarcodeKind::Dynamic
    }
}

/// Decode a barcode with the default configuration
pub fn decode_barcode(bytes: &[u8]) -> UicResult<Barcode> {
    decode_barcode_with_config(bytes, &FrameConfig::default())
}

pub fn decode_barcode_with_config(bytes: &[u8], config: &FrameConfig) -> UicResult<Barcode> {
    config.validate()?;
    let kind = detect(bytes);
    log::debug!("Detected {:?} barcode of {} bytes", kind, bytes.len());
    match kind {
        BarcodeKind::Static => StaticFrame::decode_with_config(bytes, config).map(Barcode::Static),
        BarcodeKind::Dynamic => DynamicFrame::decode_with_config(bytes, config).map(Barcode::Dynamic),
        BarcodeKind::Ssb => SsbFrame::decode(bytes).map(Barcode::Ssb),
    }
}

impl Barcode {
    pub fn kind(&self) -> BarcodeKind {
        match self {
            Barcode::Static(_) => BarcodeKind::Static,
            Barcode::Dynamic(_) => BarcodeKind::Dynamic,
            Barcode::Ssb(_) => BarcodeKind::Ssb,
        }
    }

    pub fn encode(&self) -> UicResult<Vec<u8>> {
        match self {
            Barcode::Static(frame) => frame.encode(),
            Barcode::Dynamic(frame) => frame.encode(),
            Barcode::Ssb(frame) => frame.encode(),
        }
    }

    /// FCB tickets carried by the barcode; an SSB carries none
    pub fn ticket_payloads(&self) -> UicResult<Vec<TicketPayload>> {
        self.tickets(&OpaqueTicketCodec::new())
    }

    /// FCB tickets mapped through `codec`
    pub fn tickets<C: TicketCodec>(&self, codec: &C) -> UicResult<Vec<C::Ticket>> {
        match self {
            Barcode::Static(frame) => Ok(frame.ticket(codec)?.into_iter().collect()),
            Barcode::Dynamic(frame) => frame.tickets(codec),
            Barcode::Ssb(_) => Ok(Vec::new()),
        }
    }

    /// Validate the issuer signature
    ///
    /// For a Dynamic Frame this is the level 1 signature; its algorithm is
    /// taken from the frame and `algorithm_oid` is ignored.
    pub fn verify(
        &self,
        verifier: &dyn SignatureVerifier,
        public_key: &[u8],
        algorithm_oid: &str,
    ) -> SignatureValidation {
        match self {
            Barcode::Static(frame) => frame.verify(verifier, public_key, algorithm_oid),
            Barcode::Dynamic(frame) => frame.validate_level1(verifier, Some(public_key)),
            Barcode::Ssb(frame) => frame.verify(verifier, public_key, algorithm_oid),
        }
    }
}
