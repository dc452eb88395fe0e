//! Small Structured Barcode (SSB)
//!
//! # Frame Structure
//!
//! ```text
//! bits 0..27     header: version 4 | issuer 14 | key id 4 | ticket type 5
//! bits 27..464   ticket body (437 bits)
//! bytes 58..114  signature: r (28) ‖ s (28)
//! ```
//!
//! The signature covers bytes `0..58`. Verification converts the raw
//! components to DER before handing them to the verifier.

pub mod charset;
pub mod header;
pub mod tickets;

pub use header::SsbHeader;
pub use tickets::{
    SsbCommon, SsbGroup, SsbNonReservation, SsbPass, SsbReservation, SsbStations, SsbTicket,
};

use uic_core::{BitBuffer, ResultExt, UicError, UicResult};
use uic_security::der;
use uic_security::{SignatureValidation, SignatureVerifier, Signer};

/// Total frame length in bytes
pub const SSB_LEN: usize = 114;

/// Bytes covered by the signature
pub const SIGNED_LEN: usize = 58;

/// Width of each raw signature component
const COMPONENT_LEN: usize = 28;

/// Signed bytes of a decoded or signed frame, kept while its content is unchanged
#[derive(Debug, Clone)]
struct SignedSnapshot {
    header: SsbHeader,
    ticket: SsbTicket,
    bytes: Vec<u8>,
}

/// SSB frame
#[derive(Debug, Clone)]
pub struct SsbFrame {
    pub header: SsbHeader,
    pub ticket: SsbTicket,
    /// Raw `r ‖ s` signature, 56 bytes; all zero when unsigned
    pub signature: Vec<u8>,
    signed: Option<SignedSnapshot>,
}

impl PartialEq for SsbFrame {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.ticket == other.ticket && self.signature == other.signature
    }
}

impl Eq for SsbFrame {}

impl SsbFrame {
    /// Create an unsigned frame
    pub fn new(header: SsbHeader, ticket: SsbTicket) -> Self {
        Self {
            header,
            ticket,
            signature: vec![0u8; SSB_LEN - SIGNED_LEN],
            signed: None,
        }
    }

    pub fn decode(bytes: &[u8]) -> UicResult<Self> {
        if bytes.len() != SSB_LEN {
            return Err(UicError::InvalidLength {
                expected: SSB_LEN,
                actual: bytes.len(),
            });
        }
        let mut reader = BitBuffer::from_bytes(bytes);
        let (header, ticket_type) = SsbHeader::decode(&mut reader).field("header")?;
        let ticket = SsbTicket::decode(ticket_type, &mut reader).field("ticket")?;
        reader.seek(SIGNED_LEN * 8)?;
        let signature = reader.get_bytes(SSB_LEN - SIGNED_LEN)?;
        log::debug!(
            "Decoded SSB v{} from issuer {} key {}: ticket type {}",
            header.version,
            header.issuer,
            header.key_id,
            ticket_type
        );

        Ok(Self {
            header,
            signed: Some(SignedSnapshot {
                header,
                ticket: ticket.clone(),
                bytes: bytes[..SIGNED_LEN].to_vec(),
            }),
            ticket,
            signature,
        })
    }

    fn encode_signed_part(&self) -> UicResult<Vec<u8>> {
        let mut writer = BitBuffer::zeroed(SIGNED_LEN);
        self.header
            .encode(&mut writer, self.ticket.ticket_type())
            .field("header")?;
        self.ticket.encode(&mut writer).field("ticket")?;
        Ok(writer.into_bytes())
    }

    /// Bytes covered by the signature
    ///
    /// A decoded frame reproduces the received bytes while its header and
    /// ticket are unchanged.
    pub fn signed_data(&self) -> UicResult<Vec<u8>> {
        match &self.signed {
            Some(snapshot) if snapshot.header == self.header && snapshot.ticket == self.ticket => {
                Ok(snapshot.bytes.clone())
            }
            _ => self.encode_signed_part(),
        }
    }

    pub fn encode(&self) -> UicResult<Vec<u8>> {
        if self.signature.len() != SSB_LEN - SIGNED_LEN {
            return Err(UicError::InvalidLength {
                expected: SSB_LEN - SIGNED_LEN,
                actual: self.signature.len(),
            })
            .field("signature");
        }
        let mut out = self.signed_data()?;
        out.extend_from_slice(&self.signature);
        Ok(out)
    }

    /// Sign bytes `0..58` and store the raw signature
    ///
    /// Each signature component must fit 28 bytes.
    pub fn sign(&mut self, signer: &dyn Signer) -> UicResult<()> {
        let bytes = self.signed_data()?;
        let signature = signer.sign(&bytes)?;
        self.signature = der::signature_to_raw(&signature, COMPONENT_LEN)?;
        self.signed = Some(SignedSnapshot {
            header: self.header,
            ticket: self.ticket.clone(),
            bytes,
        });
        Ok(())
    }

    /// Signature in DER form, or `None` when unsigned
    pub fn signature_der(&self) -> UicResult<Option<Vec<u8>>> {
        if self.signature.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        der::signature_from_raw(&self.signature).map(Some)
    }

    pub fn verify(
        &self,
        verifier: &dyn SignatureVerifier,
        public_key: &[u8],
        algorithm_oid: &str,
    ) -> SignatureValidation {
        let signature = match self.signature_der() {
            Ok(Some(signature)) => signature,
            Ok(None) => return SignatureValidation::SignatureMissing,
            Err(_) => return SignatureValidation::EncodingError,
        };
        if public_key.is_empty() {
            return SignatureValidation::KeyMissing;
        }
        if algorithm_oid.is_empty() {
            return SignatureValidation::AlgorithmMissing;
        }
        let Ok(data) = self.signed_data() else {
            return SignatureValidation::EncodingError;
        };
        SignatureValidation::from_verification(verifier.verify(&signature, &data, public_key, algorithm_oid))
    }
}
