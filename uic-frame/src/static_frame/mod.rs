//! Static Frame (`#UT`) encoding and decoding
//!
//! # Frame Structure
//!
//! ```text
//! "#UT" | version (2) | provider (4) | key id (5) | signature (50 or 64) | length (4) | zlib data
//! ```
//!
//! The zlib data inflates to a sequence of [`DataRecord`]s. The signature
//! covers the compressed bytes exactly as transmitted.
//!
//! # Signature Slot
//!
//! - Version `01`: DER signature, zero-padded to 50 bytes
//! - Version `02`: raw `r ‖ s`, 32 bytes each
//!
//! # Usage Example
//!
//! ```rust
//! use uic_frame::static_frame::{DataRecord, GenericRecord, StaticFrame};
//! use uic_frame::StaticVersion;
//!
//! let mut frame = StaticFrame::new(StaticVersion::V2, "1080", "00001");
//! frame.records.push(DataRecord::Generic(GenericRecord {
//!     tag: "0080BL".to_string(),
//!     version: 3,
//!     content: b"data".to_vec(),
//! }));
//! let bytes = frame.encode()?;
//! assert_eq!(&bytes[..5], b"#UT02");
//! assert_eq!(StaticFrame::decode(&bytes)?.records, frame.records);
//! # Ok::<(), uic_core::UicError>(())
//! ```

pub mod header;
pub mod layout;
pub mod records;

pub use header::UicHeaderRecord;
pub use layout::{LayoutField, TicketLayoutRecord};
pub use records::{decode_records, encode_records, DataRecord, FlexRecord, GenericRecord};

use crate::compression::{Compressor, ZlibCompressor};
use crate::config::{FrameConfig, StaticVersion};
use records::{read_ascii, read_digits, write_ascii, write_digits};
use uic_core::{ResultExt, UicError, UicResult};
use uic_security::der;
use uic_security::{SignatureValidation, SignatureVerifier, Signer};
use uic_ticket::{TicketCodec, TicketPayload};

/// Frame magic
pub const MAGIC: &[u8; 3] = b"#UT";

/// Bytes between the magic and the signature: version, provider, key id
const ID_LEN: usize = 2 + 4 + 5;

/// Width of each raw signature component in a version 2 slot
const V2_COMPONENT_LEN: usize = 32;

/// Record bytes together with the compressed form that was transmitted or signed
#[derive(Debug, Clone, PartialEq, Eq)]
struct PackedRecords {
    plain: Vec<u8>,
    compressed: Vec<u8>,
}

/// Static Frame
#[derive(Debug, Clone)]
pub struct StaticFrame {
    pub version: StaticVersion,
    /// RICS code of the security provider (4 characters)
    pub provider: String,
    /// Signature key id (5 characters)
    pub key_id: String,
    /// Signature slot content, exactly as stored in the frame
    pub signature: Vec<u8>,
    pub records: Vec<DataRecord>,
    packed: Option<PackedRecords>,
}

impl PartialEq for StaticFrame {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.provider == other.provider
            && self.key_id == other.key_id
            && self.signature == other.signature
            && self.records == other.records
    }
}

impl Eq for StaticFrame {}

impl StaticFrame {
    /// Create an unsigned frame without records
    pub fn new(version: StaticVersion, provider: &str, key_id: &str) -> Self {
        Self {
            version,
            provider: provider.to_string(),
            key_id: key_id.to_string(),
            signature: vec![0u8; version.signature_len()],
            records: Vec::new(),
            packed: None,
        }
    }

    /// Create an unsigned frame of the configured version
    pub fn from_config(config: &FrameConfig, provider: &str, key_id: &str) -> Self {
        Self::new(config.static_version, provider, key_id)
    }

    /// Decode a frame with the default configuration
    pub fn decode(bytes: &[u8]) -> UicResult<Self> {
        Self::decode_with(bytes, &ZlibCompressor::default())
    }

    pub fn decode_with_config(bytes: &[u8], config: &FrameConfig) -> UicResult<Self> {
        Self::decode_with(bytes, &ZlibCompressor::from_config(config))
    }

    /// Decode a frame, inflating its data with `compressor`
    pub fn decode_with(bytes: &[u8], compressor: &dyn Compressor) -> UicResult<Self> {
        if !bytes.starts_with(MAGIC) {
            return Err(UicError::Structural(
                "Static frame must start with #UT".to_string(),
            ));
        }
        let mut pos = MAGIC.len();

        let number = read_digits(bytes, pos, 2, "version").field("header")?;
        let version = StaticVersion::from_number(number as u8)?;
        pos += 2;
        let provider = read_ascii(bytes, pos, 4, "provider").field("header")?.to_string();
        pos += 4;
        let key_id = read_ascii(bytes, pos, 5, "key id").field("header")?.to_string();
        pos += 5;

        let signature_len = version.signature_len();
        if bytes.len() < pos + signature_len + 4 {
            return Err(UicError::Structural(format!(
                "Static frame v{:02} header needs {} bytes, got {}",
                number,
                pos + signature_len + 4,
                bytes.len()
            )));
        }
        let signature = bytes[pos..pos + signature_len].to_vec();
        pos += signature_len;

        let declared = read_digits(bytes, pos, 4, "data length").field("header")?;
        pos += 4;
        let compressed = &bytes[pos..];
        if declared != compressed.len() {
            return Err(UicError::Structural(format!(
                "Declared data length {} does not match {} remaining bytes",
                declared,
                compressed.len()
            )));
        }

        let plain = compressor.decompress(compressed)?;
        let records = decode_records(&plain)?;
        log::debug!(
            "Decoded static frame v{:02} from {} key {}: {} records, {} bytes decompressed",
            number,
            provider,
            key_id,
            records.len(),
            plain.len()
        );

        Ok(Self {
            version,
            provider,
            key_id,
            signature,
            records,
            packed: Some(PackedRecords {
                plain,
                compressed: compressed.to_vec(),
            }),
        })
    }

    /// Compressed record data as signed and transmitted
    ///
    /// Reuses the compressed bytes captured at decode or sign time while the
    /// records are unchanged, so re-encoding reproduces the original frame.
    pub fn signed_data_with(&self, compressor: &dyn Compressor) -> UicResult<Vec<u8>> {
        let plain = encode_records(&self.records)?;
        match &self.packed {
            Some(packed) if packed.plain == plain => Ok(packed.compressed.clone()),
            _ => compressor.compress(&plain),
        }
    }

    pub fn signed_data(&self) -> UicResult<Vec<u8>> {
        self.signed_data_with(&ZlibCompressor::default())
    }

    /// Encode the frame with the default configuration
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        self.encode_with(&ZlibCompressor::default())
    }

    pub fn encode_with_config(&self, config: &FrameConfig) -> UicResult<Vec<u8>> {
        self.encode_with(&ZlibCompressor::from_config(config))
    }

    pub fn encode_with(&self, compressor: &dyn Compressor) -> UicResult<Vec<u8>> {
        let signature_len = self.version.signature_len();
        if self.signature.len() != signature_len {
            return Err(UicError::InvalidLength {
                expected: signature_len,
                actual: self.signature.len(),
            })
            .field("signature");
        }
        let compressed = self.signed_data_with(compressor)?;

        let mut out = Vec::with_capacity(MAGIC.len() + ID_LEN + signature_len + 4 + compressed.len());
        out.extend_from_slice(MAGIC);
        write_digits(&mut out, usize::from(self.version.number()), 2, "version")?;
        write_ascii(&mut out, &self.provider, 4, "provider")?;
        write_ascii(&mut out, &self.key_id, 5, "key id")?;
        out.extend_from_slice(&self.signature);
        write_digits(&mut out, compressed.len(), 4, "data length")?;
        out.extend_from_slice(&compressed);
        log::debug!(
            "Encoded static frame v{:02}: {} records, {} bytes",
            self.version.number(),
            self.records.len(),
            out.len()
        );
        Ok(out)
    }

    pub fn sign(&mut self, signer: &dyn Signer) -> UicResult<()> {
        self.sign_with(signer, &ZlibCompressor::default())
    }

    /// Sign the compressed record data and store the signature in the slot
    pub fn sign_with(&mut self, signer: &dyn Signer, compressor: &dyn Compressor) -> UicResult<()> {
        let plain = encode_records(&self.records)?;
        let compressed = match &self.packed {
            Some(packed) if packed.plain == plain => packed.compressed.clone(),
            _ => compressor.compress(&plain)?,
        };
        let signature = signer.sign(&compressed)?;

        self.signature = match self.version {
            StaticVersion::V1 => {
                let slot_len = self.version.signature_len();
                if signature.len() > slot_len {
                    return Err(UicError::InvalidSignature(format!(
                        "DER signature of {} bytes does not fit the {}-byte slot",
                        signature.len(),
                        slot_len
                    )));
                }
                let mut slot = signature;
                slot.resize(slot_len, 0);
                slot
            }
            StaticVersion::V2 => der::signature_to_raw(&signature, V2_COMPONENT_LEN)?,
        };
        self.packed = Some(PackedRecords { plain, compressed });
        Ok(())
    }

    /// Signature in DER form, or `None` for an empty slot
    pub fn signature_der(&self) -> UicResult<Option<Vec<u8>>> {
        if self.signature.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        match self.version {
            StaticVersion::V1 => {
                let length = der::element_length(&self.signature)
                    .map_err(|e| UicError::InvalidSignature(e.to_string()))?;
                if length > self.signature.len() {
                    return Err(UicError::InvalidSignature(
                        "DER signature overruns its slot".to_string(),
                    ));
                }
                Ok(Some(self.signature[..length].to_vec()))
            }
            StaticVersion::V2 => der::signature_from_raw(&self.signature).map(Some),
        }
    }

    pub fn verify(
        &self,
        verifier: &dyn SignatureVerifier,
        public_key: &[u8],
        algorithm_oid: &str,
    ) -> SignatureValidation {
        self.verify_with(verifier, public_key, algorithm_oid, &ZlibCompressor::default())
    }

    /// Check the signature against the issuer's public key
    pub fn verify_with(
        &self,
        verifier: &dyn SignatureVerifier,
        public_key: &[u8],
        algorithm_oid: &str,
        compressor: &dyn Compressor,
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
        if self.records.is_empty() {
            return SignatureValidation::SignedDataMissing;
        }
        let data = match self.signed_data_with(compressor) {
            Ok(data) => data,
            Err(_) => return SignatureValidation::EncodingError,
        };
        SignatureValidation::from_verification(verifier.verify(&signature, &data, public_key, algorithm_oid))
    }

    pub fn header_record(&self) -> Option<&UicHeaderRecord> {
        self.records.iter().find_map(|record| match record {
            DataRecord::Header(header) => Some(header),
            _ => None,
        })
    }

    pub fn layout_record(&self) -> Option<&TicketLayoutRecord> {
        self.records.iter().find_map(|record| match record {
            DataRecord::Layout(layout) => Some(layout),
            _ => None,
        })
    }

    /// Ticket carried in the `U_FLEX` record, if any
    pub fn ticket_payload(&self) -> Option<&TicketPayload> {
        self.records.iter().find_map(|record| match record {
            DataRecord::Flex(flex) => Some(&flex.payload),
            _ => None,
        })
    }

    /// Ticket of the `U_FLEX` record, mapped through `codec`
    pub fn ticket<C: TicketCodec>(&self, codec: &C) -> UicResult<Option<C::Ticket>> {
        self.ticket_payload()
            .map(|payload| codec.decode(payload).field(records::TAG_FLEX))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uic_ticket::FcbVersion;

    fn sample_frame(version: StaticVersion) -> StaticFrame {
        let mut frame = StaticFrame::new(version, "1080", "00002");
        frame.records.push(DataRecord::Header(UicHeaderRecord {
            version: 1,
            issuer: "1080".to_string(),
            identifier: "00000000000000000042".to_string(),
            issued_at: "010120241200".to_string(),
            flags: 0,
            language: "DE".to_string(),
            additional_language: "  ".to_string(),
        }));
        frame.records.push(DataRecord::Flex(FlexRecord {
            payload: TicketPayload::new(FcbVersion::V3, vec![0x42, 0x00, 0x17]),
        }));
        frame
    }

    #[test]
    fn test_roundtrip_v2() {
        let frame = sample_frame(StaticVersion::V2);
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[..14], b"#UT02108000002");
        assert_eq!(&bytes[14..78], &[0u8; 64][..]);

        let decoded = StaticFrame::decode(&bytes).unwrap();
        assert_eq!(decoded.records, frame.records);
        assert_eq!(decoded.header_record().unwrap().language, "DE");
        assert_eq!(decoded.ticket_payload().unwrap().version, FcbVersion::V3);
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_v1_signature_slot() {
        let bytes = sample_frame(StaticVersion::V1).encode().unwrap();
        assert_eq!(&bytes[..5], b"#UT01");
        let length: usize = std::str::from_utf8(&bytes[64..68]).unwrap().parse().unwrap();
        assert_eq!(length, bytes.len() - 68);
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(StaticFrame::decode(b"#U"), Err(UicError::Structural(_))));
        assert!(matches!(StaticFrame::decode(b"#XT01"), Err(UicError::Structural(_))));
    }

    #[test]
    fn test_unknown_version() {
        let mut bytes = sample_frame(StaticVersion::V2).encode().unwrap();
        bytes[4] = b'3';
        assert!(StaticFrame::decode(&bytes).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let mut bytes = sample_frame(StaticVersion::V2).encode().unwrap();
        bytes.push(0x00);
        let err = StaticFrame::decode(&bytes).unwrap_err();
        assert!(matches!(err, UicError::Structural(ref msg) if msg.contains("Declared data length")));
    }

    #[test]
    fn test_empty_slot_is_missing_signature() {
        let frame = sample_frame(StaticVersion::V2);
        assert_eq!(frame.signature_der().unwrap(), None);
    }
}
