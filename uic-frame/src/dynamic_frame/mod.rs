//! Dynamic Frame (`U1`/`U2`) encoding, decoding, signing and validation
//!
//! The whole frame is a single UPER-encoded structure:
//!
//! ```text
//! UicBarcodeHeader
//! ├── format ("U1" | "U2")
//! ├── level2SignedData
//! │   ├── level1Data            signed by the issuer (level 1)
//! │   │   ├── security provider, key id, algorithm OIDs
//! │   │   ├── dataSequence      FCB tickets and other data blocks
//! │   │   └── level2PublicKey   key of the presenting device
//! │   ├── level1Signature
//! │   └── level2Data            dynamic content, signed by the device
//! └── level2Signature           covers level2SignedData (level 2)
//! ```
//!
//! # Signed Bytes
//!
//! Each level signs the standalone UPER encoding of its structure. Decoding
//! keeps the exact bits of both structures as received, and validation uses
//! them while the decoded structures are unchanged. A frame whose data was
//! modified is re-encoded for validation.
//!
//! All SEQUENCEs are extensible. Extension additions from newer schema
//! versions are skipped when [`FrameConfig::skip_unknown_extensions`] is set;
//! they remain covered by the captured signed bytes.

pub mod content;

pub use content::{
    CoordinateSystem, DynamicContent, ExtensionData, GeoCoordinate, GeoUnit, HemisphereLatitude,
    HemisphereLongitude, TimeStamp,
};

use crate::config::{DynamicFormat, FrameConfig};
use uic_asn1::{UperDecoder, UperEncoder};
use uic_core::{BitBuffer, ResultExt, UicError, UicResult};
use uic_security::{SignatureValidation, SignatureVerifier, Signer};
use uic_ticket::{decode_payload, FcbVersion, TicketCodec, TicketPayload};

/// Handle the extension additions of a SEQUENCE after its root fields
pub(crate) fn finish_extensions(
    decoder: &mut UperDecoder,
    extended: bool,
    config: &FrameConfig,
    what: &str,
) -> UicResult<()> {
    if !extended {
        return Ok(());
    }
    if !config.skip_unknown_extensions {
        return Err(UicError::Unsupported(format!(
            "{} carries extension additions",
            what
        )));
    }
    let skipped = decoder.skip_sequence_extensions()?;
    log::warn!("Skipped {} unknown extension additions of {}", skipped, what);
    Ok(())
}

/// Copy bits `start..end` of `source` into a new zero-padded buffer
fn copy_bits(source: &[u8], start: usize, end: usize) -> UicResult<Vec<u8>> {
    let mut reader = BitBuffer::from_bytes(source);
    reader.seek(start)?;
    let mut writer = BitBuffer::with_capacity_bits(end - start);
    let mut left = end - start;
    while left > 0 {
        let count = left.min(64);
        writer.put_bits(reader.get_bits(count)?, count)?;
        left -= count;
    }
    Ok(writer.into_bytes())
}

/// Append the first `bits` bits of `bytes` to the encoder
fn write_bits(encoder: &mut UperEncoder, bytes: &[u8], bits: usize) -> UicResult<()> {
    let mut reader = BitBuffer::from_bytes(bytes);
    let mut left = bits;
    while left > 0 {
        let count = left.min(64);
        encoder.encode_bits(reader.get_bits(count)?, count)?;
        left -= count;
    }
    Ok(())
}

/// Encoded bits of a structure as received or signed
#[derive(Debug, Clone)]
struct Snapshot<T> {
    value: T,
    format: DynamicFormat,
    bytes: Vec<u8>,
    bits: usize,
}

impl<T: PartialEq> Snapshot<T> {
    fn matches(&self, value: &T, format: DynamicFormat) -> bool {
        self.format == format && &self.value == value
    }
}

/// Interpreted content of a data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataContent {
    /// `FCB1`, `FCB2` or `FCB3` ticket
    Ticket(TicketPayload),
    /// `FDC1` dynamic content
    Dynamic(DynamicContent),
    /// Any other format, kept as is
    Unknown { format: String, data: Vec<u8> },
}

impl DataContent {
    pub fn to_block(&self) -> UicResult<DataBlock> {
        match self {
            DataContent::Ticket(payload) => Ok(DataBlock::from_ticket(payload)),
            DataContent::Dynamic(content) => DataBlock::from_dynamic_content(content),
            DataContent::Unknown { format, data } => Ok(DataBlock::new(format, data.clone())),
        }
    }
}

/// Format-tagged data block (`DataType`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub format: String,
    pub data: Vec<u8>,
}

impl DataBlock {
    pub fn new(format: &str, data: Vec<u8>) -> Self {
        Self {
            format: format.to_string(),
            data,
        }
    }

    pub fn from_ticket(payload: &TicketPayload) -> Self {
        Self::new(payload.format(), payload.bytes.clone())
    }

    pub fn from_dynamic_content(content: &DynamicContent) -> UicResult<Self> {
        Ok(Self::new(content::FORMAT, content.encode()?))
    }

    pub fn content(&self) -> UicResult<DataContent> {
        self.content_with_config(&FrameConfig::default())
    }

    /// Interpret the block according to its format
    pub fn content_with_config(&self, config: &FrameConfig) -> UicResult<DataContent> {
        if FcbVersion::is_ticket_format(&self.format) {
            return Ok(DataContent::Ticket(decode_payload(&self.format, &self.data)?));
        }
        if self.format == content::FORMAT {
            let content = DynamicContent::decode_with_config(&self.data, config).field(content::FORMAT)?;
            return Ok(DataContent::Dynamic(content));
        }
        log::warn!(
            "Unknown data format {:?}, keeping {} bytes opaque",
            self.format,
            self.data.len()
        );
        Ok(DataContent::Unknown {
            format: self.format.clone(),
            data: self.data.clone(),
        })
    }

    fn encode_to(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_ia5_string(&self.format, None).field("format")?;
        encoder.encode_octet_string(&self.data, None).field("data")
    }

    fn decode_from(decoder: &mut UperDecoder, config: &FrameConfig) -> UicResult<Self> {
        let extended = decoder.decode_sequence_extension_marker()?;
        let format = decoder.decode_ia5_string(None).field("format")?;
        let data = decoder.decode_octet_string(None).field("data")?;
        finish_extensions(decoder, extended, config, "DataType")?;
        Ok(Self { format, data })
    }
}

/// Issuer-signed data (`Level1DataType`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Level1Data {
    /// RICS code of the security provider, 1..=32000
    pub security_provider_num: Option<i64>,
    pub security_provider_ia5: Option<String>,
    /// 0..=99999
    pub key_id: Option<i64>,
    pub data_sequence: Vec<DataBlock>,
    pub level1_key_alg: Option<String>,
    pub level2_key_alg: Option<String>,
    pub level1_signing_alg: Option<String>,
    pub level2_signing_alg: Option<String>,
    pub level2_public_key: Option<Vec<u8>>,
    /// `U2` only, 2016..=2269
    pub end_of_validity_year: Option<i64>,
    /// `U2` only, 1..=366
    pub end_of_validity_day: Option<i64>,
    /// `U2` only, minutes of the day, 0..=1439
    pub end_of_validity_time: Option<i64>,
    /// `U2` only, seconds, 1..=3600
    pub validity_duration: Option<i64>,
}

impl Level1Data {
    fn validity_fields(&self) -> [(&'static str, Option<i64>); 4] {
        [
            ("endOfValidityYear", self.end_of_validity_year),
            ("endOfValidityDay", self.end_of_validity_day),
            ("endOfValidityTime", self.end_of_validity_time),
            ("validityDuration", self.validity_duration),
        ]
    }

    /// Standalone UPER encoding, as signed at level 1
    pub fn encode(&self, format: DynamicFormat) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        self.encode_to(&mut encoder, format)?;
        Ok(encoder.into_bytes())
    }

    fn encode_to(&self, encoder: &mut UperEncoder, format: DynamicFormat) -> UicResult<()> {
        let mut present = vec![
            self.security_provider_num.is_some(),
            self.security_provider_ia5.is_some(),
            self.key_id.is_some(),
            self.level1_key_alg.is_some(),
            self.level2_key_alg.is_some(),
            self.level1_signing_alg.is_some(),
            self.level2_signing_alg.is_some(),
            self.level2_public_key.is_some(),
        ];
        match format {
            DynamicFormat::U1 => {
                for (name, value) in self.validity_fields() {
                    if value.is_some() {
                        return Err(UicError::Structural(
                            "Field is only defined for format U2".to_string(),
                        ))
                        .field(name);
                    }
                }
            }
            DynamicFormat::U2 => {
                present.extend(self.validity_fields().iter().map(|(_, value)| value.is_some()));
            }
        }

        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_presence_bitmap(&present)?;
        if let Some(num) = self.security_provider_num {
            encoder.encode_constrained_int(num, 1, 32_000, false).field("securityProviderNum")?;
        }
        if let Some(ia5) = &self.security_provider_ia5 {
            encoder.encode_ia5_string(ia5, None).field("securityProviderIA5")?;
        }
        if let Some(key_id) = self.key_id {
            encoder.encode_constrained_int(key_id, 0, 99_999, false).field("keyId")?;
        }
        encoder
            .encode_sequence_of(&self.data_sequence, None, |encoder, block| block.encode_to(encoder))
            .field("dataSequence")?;
        let algorithms = [
            ("level1KeyAlg", &self.level1_key_alg),
            ("level2KeyAlg", &self.level2_key_alg),
            ("level1SigningAlg", &self.level1_signing_alg),
            ("level2SigningAlg", &self.level2_signing_alg),
        ];
        for (name, oid) in algorithms {
            if let Some(oid) = oid {
                encoder.encode_object_identifier(oid).field(name)?;
            }
        }
        if let Some(key) = &self.level2_public_key {
            encoder.encode_octet_string(key, None).field("level2PublicKey")?;
        }
        if format == DynamicFormat::U2 {
            if let Some(year) = self.end_of_validity_year {
                encoder.encode_constrained_int(year, 2016, 2269, false).field("endOfValidityYear")?;
            }
            if let Some(day) = self.end_of_validity_day {
                encoder.encode_constrained_int(day, 1, 366, false).field("endOfValidityDay")?;
            }
            if let Some(time) = self.end_of_validity_time {
                encoder.encode_constrained_int(time, 0, 1439, false).field("endOfValidityTime")?;
            }
            if let Some(duration) = self.validity_duration {
                encoder.encode_constrained_int(duration, 1, 3600, false).field("validityDuration")?;
            }
        }
        Ok(())
    }

    fn decode_from(decoder: &mut UperDecoder, format: DynamicFormat, config: &FrameConfig) -> UicResult<Self> {
        let extended = decoder.decode_sequence_extension_marker()?;
        let optional_count = match format {
            DynamicFormat::U1 => 8,
            DynamicFormat::U2 => 12,
        };
        let present = decoder.decode_presence_bitmap(optional_count)?;

        let mut data = Level1Data::default();
        if present[0] {
            data.security_provider_num =
                Some(decoder.decode_constrained_int(1, 32_000, false).field("securityProviderNum")?);
        }
        if present[1] {
            data.security_provider_ia5 = Some(decoder.decode_ia5_string(None).field("securityProviderIA5")?);
        }
        if present[2] {
            data.key_id = Some(decoder.decode_constrained_int(0, 99_999, false).field("keyId")?);
        }
        data.data_sequence = decoder
            .decode_sequence_of(None, |decoder| DataBlock::decode_from(decoder, config))
            .field("dataSequence")?;
        if present[3] {
            data.level1_key_alg = Some(decoder.decode_object_identifier().field("level1KeyAlg")?);
        }
        if present[4] {
            data.level2_key_alg = Some(decoder.decode_object_identifier().field("level2KeyAlg")?);
        }
        if present[5] {
            data.level1_signing_alg = Some(decoder.decode_object_identifier().field("level1SigningAlg")?);
        }
        if present[6] {
            data.level2_signing_alg = Some(decoder.decode_object_identifier().field("level2SigningAlg")?);
        }
        if present[7] {
            data.level2_public_key = Some(decoder.decode_octet_string(None).field("level2PublicKey")?);
        }
        if format == DynamicFormat::U2 {
            if present[8] {
                data.end_of_validity_year =
                    Some(decoder.decode_constrained_int(2016, 2269, false).field("endOfValidityYear")?);
            }
            if present[9] {
                data.end_of_validity_day =
                    Some(decoder.decode_constrained_int(1, 366, false).field("endOfValidityDay")?);
            }
            if present[10] {
                data.end_of_validity_time =
                    Some(decoder.decode_constrained_int(0, 1439, false).field("endOfValidityTime")?);
            }
            if present[11] {
                data.validity_duration =
                    Some(decoder.decode_constrained_int(1, 3600, false).field("validityDuration")?);
            }
        }
        finish_extensions(decoder, extended, config, "Level1DataType")?;
        Ok(data)
    }
}

/// Data covered by the level 2 signature (`Level2DataType`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Level2Data {
    pub level1_data: Level1Data,
    /// DER signature over the encoded level 1 data
    pub level1_signature: Option<Vec<u8>>,
    pub level2_data: Option<DataBlock>,
}

impl Level2Data {
    pub fn new(level1_data: Level1Data) -> Self {
        Self {
            level1_data,
            ..Self::default()
        }
    }

    /// Standalone UPER encoding, as signed at level 2
    pub fn encode(&self, format: DynamicFormat) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        self.encode_to(&mut encoder, format, None)?;
        Ok(encoder.into_bytes())
    }

    /// Encode, writing `level1` in place of the level 1 data when given
    fn encode_to(
        &self,
        encoder: &mut UperEncoder,
        format: DynamicFormat,
        level1: Option<&Snapshot<Level1Data>>,
    ) -> UicResult<()> {
        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_presence_bitmap(&[self.level1_signature.is_some(), self.level2_data.is_some()])?;
        match level1 {
            Some(snapshot) => write_bits(encoder, &snapshot.bytes, snapshot.bits).field("level1Data")?,
            None => self.level1_data.encode_to(encoder, format).field("level1Data")?,
        }
        if let Some(signature) = &self.level1_signature {
            encoder.encode_octet_string(signature, None).field("level1Signature")?;
        }
        if let Some(block) = &self.level2_data {
            block.encode_to(encoder).field("level2Data")?;
        }
        Ok(())
    }

    /// Decode and return the bit span occupied by the level 1 data
    fn decode_from(
        decoder: &mut UperDecoder,
        format: DynamicFormat,
        config: &FrameConfig,
    ) -> UicResult<(Self, (usize, usize))> {
        let extended = decoder.decode_sequence_extension_marker()?;
        let present = decoder.decode_presence_bitmap(2)?;
        let start = decoder.position();
        let level1_data = Level1Data::decode_from(decoder, format, config).field("level1Data")?;
        let end = decoder.position();
        let level1_signature = if present[0] {
            Some(decoder.decode_octet_string(None).field("level1Signature")?)
        } else {
            None
        };
        let level2_data = if present[1] {
            Some(DataBlock::decode_from(decoder, config).field("level2Data")?)
        } else {
            None
        };
        finish_extensions(decoder, extended, config, "Level2DataType")?;
        Ok((
            Self {
                level1_data,
                level1_signature,
                level2_data,
            },
            (start, end),
        ))
    }
}

/// Dynamic Frame (`UicBarcodeHeader`)
#[derive(Debug, Clone)]
pub struct DynamicFrame {
    pub format: DynamicFormat,
    pub level2_signed_data: Level2Data,
    /// DER signature over the encoded level 2 signed data
    pub level2_signature: Option<Vec<u8>>,
    level1_snapshot: Option<Snapshot<Level1Data>>,
    level2_snapshot: Option<Snapshot<Level2Data>>,
}

impl PartialEq for DynamicFrame {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.level2_signed_data == other.level2_signed_data
            && self.level2_signature == other.level2_signature
    }
}

impl Eq for DynamicFrame {}

impl DynamicFrame {
    /// Create an unsigned frame
    pub fn new(format: DynamicFormat, level1_data: Level1Data) -> Self {
        Self {
            format,
            level2_signed_data: Level2Data::new(level1_data),
            level2_signature: None,
            level1_snapshot: None,
            level2_snapshot: None,
        }
    }

    /// Create an unsigned frame of the configured format
    pub fn from_config(config: &FrameConfig, level1_data: Level1Data) -> Self {
        Self::new(config.dynamic_format, level1_data)
    }

    pub fn level1_data(&self) -> &Level1Data {
        &self.level2_signed_data.level1_data
    }

    pub fn level1_data_mut(&mut self) -> &mut Level1Data {
        &mut self.level2_signed_data.level1_data
    }

    /// Decode a frame with the default configuration
    pub fn decode(bytes: &[u8]) -> UicResult<Self> {
        Self::decode_with_config(bytes, &FrameConfig::default())
    }

    pub fn decode_with_config(bytes: &[u8], config: &FrameConfig) -> UicResult<Self> {
        let mut decoder = UperDecoder::new(bytes);
        let extended = decoder.decode_sequence_extension_marker()?;
        let present = decoder.decode_presence_bitmap(1)?;
        let format_text = decoder.decode_ia5_string(None).field("format")?;
        let format = DynamicFormat::from_format(&format_text).field("format")?;

        let level2_start = decoder.position();
        let (level2_signed_data, (level1_start, level1_end)) =
            Level2Data::decode_from(&mut decoder, format, config).field("level2SignedData")?;
        let level2_end = decoder.position();

        let level2_signature = if present[0] {
            Some(decoder.decode_octet_string(None).field("level2Signature")?)
        } else {
            None
        };
        finish_extensions(&mut decoder, extended, config, "UicBarcodeHeader")?;

        let consumed = decoder.consumed_bytes();
        if bytes[consumed..].iter().any(|&b| b != 0) {
            return Err(UicError::Structural(format!(
                "{} trailing bytes after dynamic frame",
                bytes.len() - consumed
            )));
        }

        let level1_snapshot = Snapshot {
            value: level2_signed_data.level1_data.clone(),
            format,
            bytes: copy_bits(bytes, level1_start, level1_end)?,
            bits: level1_end - level1_start,
        };
        let level2_snapshot = Snapshot {
            value: level2_signed_data.clone(),
            format,
            bytes: copy_bits(bytes, level2_start, level2_end)?,
            bits: level2_end - level2_start,
        };
        log::debug!(
            "Decoded dynamic frame {} with {} data blocks, level 1 {} bits, level 2 {} bits",
            format.as_str(),
            level2_signed_data.level1_data.data_sequence.len(),
            level1_snapshot.bits,
            level2_snapshot.bits
        );

        Ok(Self {
            format,
            level2_signed_data,
            level2_signature,
            level1_snapshot: Some(level1_snapshot),
            level2_snapshot: Some(level2_snapshot),
        })
    }

    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_presence_bitmap(&[self.level2_signature.is_some()])?;
        encoder.encode_ia5_string(self.format.as_str(), None).field("format")?;
        self.encode_level2_to(&mut encoder)?;
        if let Some(signature) = &self.level2_signature {
            encoder.encode_octet_string(signature, None).field("level2Signature")?;
        }
        let bytes = encoder.into_bytes();
        log::debug!("Encoded dynamic frame {}: {} bytes", self.format.as_str(), bytes.len());
        Ok(bytes)
    }

    /// Level 1 snapshot, while the level 1 data is unchanged
    fn current_level1_snapshot(&self) -> Option<&Snapshot<Level1Data>> {
        self.level1_snapshot
            .as_ref()
            .filter(|snapshot| snapshot.matches(&self.level2_signed_data.level1_data, self.format))
    }

    /// Write the level 2 signed data, reusing the captured bits of each level
    /// that is unchanged
    fn encode_level2_to(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        match &self.level2_snapshot {
            Some(snapshot) if snapshot.matches(&self.level2_signed_data, self.format) => {
                write_bits(encoder, &snapshot.bytes, snapshot.bits)
            }
            _ => self
                .level2_signed_data
                .encode_to(encoder, self.format, self.current_level1_snapshot())
                .field("level2SignedData"),
        }
    }

    /// Bytes covered by the level 1 signature
    pub fn level1_signed_bytes(&self) -> UicResult<Vec<u8>> {
        match self.current_level1_snapshot() {
            Some(snapshot) => Ok(snapshot.bytes.clone()),
            None => self.level1_data().encode(self.format).field("level1Data"),
        }
    }

    /// Bytes covered by the level 2 signature
    pub fn level2_signed_bytes(&self) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        self.encode_level2_to(&mut encoder)?;
        Ok(encoder.into_bytes())
    }

    fn check_algorithm(current: &mut Option<String>, signer_oid: String, locked: bool, name: &str) -> UicResult<()> {
        match current {
            Some(oid) if *oid != signer_oid => Err(UicError::Security(format!(
                "{} {} does not match signer algorithm {}",
                name, oid, signer_oid
            ))),
            Some(_) => Ok(()),
            None if locked => Err(UicError::Security(format!(
                "{} must be set before the level 1 signature is created",
                name
            ))),
            None => {
                *current = Some(signer_oid);
                Ok(())
            }
        }
    }

    /// Sign the level 1 data with the issuer key
    ///
    /// Records the signer's algorithm as `level1SigningAlg` when unset.
    pub fn sign_level1(&mut self, signer: &dyn Signer) -> UicResult<()> {
        let level1 = &mut self.level2_signed_data.level1_data;
        Self::check_algorithm(&mut level1.level1_signing_alg, signer.algorithm_oid(), false, "level1SigningAlg")?;

        let snapshot = match self.current_level1_snapshot() {
            Some(snapshot) => snapshot.clone(),
            None => {
                let mut encoder = UperEncoder::new();
                self.level1_data()
                    .encode_to(&mut encoder, self.format)
                    .field("level1Data")?;
                Snapshot {
                    value: self.level1_data().clone(),
                    format: self.format,
                    bits: encoder.bit_len(),
                    bytes: encoder.into_bytes(),
                }
            }
        };
        let signature = signer.sign(&snapshot.bytes)?;
        self.level1_snapshot = Some(snapshot);
        self.level2_signed_data.level1_signature = Some(signature);
        log::debug!("Created level 1 signature");
        Ok(())
    }

    /// Sign the level 2 data with the device key
    ///
    /// Records the signer's algorithm as `level2SigningAlg` when unset and
    /// the level 1 data is not yet signed.
    pub fn sign_level2(&mut self, signer: &dyn Signer) -> UicResult<()> {
        let locked = self.level2_signed_data.level1_signature.is_some();
        let level1 = &mut self.level2_signed_data.level1_data;
        Self::check_algorithm(&mut level1.level2_signing_alg, signer.algorithm_oid(), locked, "level2SigningAlg")?;

        let bytes = self.level2_signed_bytes()?;
        let signature = signer.sign(&bytes)?;
        self.level2_signature = Some(signature);
        log::debug!("Created level 2 signature over {} bytes", bytes.len());
        Ok(())
    }

    /// Validate the level 1 signature against the issuer's public key
    pub fn validate_level1(
        &self,
        verifier: &dyn SignatureVerifier,
        public_key: Option<&[u8]>,
    ) -> SignatureValidation {
        let level1 = &self.level2_signed_data.level1_data;
        let Some(signature) = &self.level2_signed_data.level1_signature else {
            return SignatureValidation::SignatureMissing;
        };
        let Some(key) = public_key.filter(|key| !key.is_empty()) else {
            return SignatureValidation::KeyMissing;
        };
        let Some(algorithm) = level1.level1_signing_alg.as_deref() else {
            return SignatureValidation::AlgorithmMissing;
        };
        if level1.data_sequence.is_empty() {
            return SignatureValidation::SignedDataMissing;
        }
        let Ok(data) = self.level1_signed_bytes() else {
            return SignatureValidation::EncodingError;
        };
        SignatureValidation::from_verification(verifier.verify(signature, &data, key, algorithm))
    }

    /// Validate the level 2 signature against the embedded level 2 public key
    pub fn validate_level2(&self, verifier: &dyn SignatureVerifier) -> SignatureValidation {
        let level1 = &self.level2_signed_data.level1_data;
        let Some(signature) = &self.level2_signature else {
            return SignatureValidation::SignatureMissing;
        };
        let Some(key) = level1.level2_public_key.as_deref().filter(|key| !key.is_empty()) else {
            return SignatureValidation::KeyMissing;
        };
        let Some(algorithm) = level1.level2_signing_alg.as_deref() else {
            return SignatureValidation::AlgorithmMissing;
        };
        if self.level2_signed_data.level2_data.is_none() {
            return SignatureValidation::SignedDataMissing;
        }
        let Ok(data) = self.level2_signed_bytes() else {
            return SignatureValidation::EncodingError;
        };
        SignatureValidation::from_verification(verifier.verify(signature, &data, key, algorithm))
    }

    /// Ticket payloads of the level 1 data sequence
    pub fn ticket_payloads(&self) -> UicResult<Vec<TicketPayload>> {
        self.level1_data()
            .data_sequence
            .iter()
            .filter(|block| FcbVersion::is_ticket_format(&block.format))
            .map(|block| decode_payload(&block.format, &block.data))
            .collect()
    }

    /// Tickets of the level 1 data sequence, mapped through `codec`
    pub fn tickets<C: TicketCodec>(&self, codec: &C) -> UicResult<Vec<C::Ticket>> {
        self.ticket_payloads()?
            .iter()
            .map(|payload| codec.decode(payload).field("dataSequence"))
            .collect()
    }

    /// Dynamic content of the level 2 data, if it carries `FDC1`
    pub fn dynamic_content(&self) -> UicResult<Option<DynamicContent>> {
        match &self.level2_signed_data.level2_data {
            Some(block) if block.format == content::FORMAT => {
                DynamicContent::decode(&block.data).field("level2Data").map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn set_dynamic_content(&mut self, content: &DynamicContent) -> UicResult<()> {
        self.level2_signed_data.level2_data = Some(DataBlock::from_dynamic_content(content)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockSigner, MockVerifier};

    fn level1() -> Level1Data {
        Level1Data {
            security_provider_num: Some(1080),
            key_id: Some(1),
            data_sequence: vec![DataBlock::new("FCB3", vec![0x12, 0x34, 0x56])],
            level1_signing_alg: Some("1.2.840.10045.4.3.2".to_string()),
            level2_signing_alg: Some("1.2.840.10045.4.3.2".to_string()),
            level2_public_key: Some(vec![0x04; 65]),
            end_of_validity_year: Some(2024),
            end_of_validity_day: Some(100),
            ..Level1Data::default()
        }
    }

    #[test]
    fn test_roundtrip_u2() {
        let mut frame = DynamicFrame::new(DynamicFormat::U2, level1());
        frame.level2_signed_data.level1_signature = Some(vec![0x30, 0x00]);
        frame.level2_signature = Some(vec![0x30, 0x01, 0x02]);
        let bytes = frame.encode().unwrap();

        let decoded = DynamicFrame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.encode().unwrap(), bytes);
        assert_eq!(decoded.ticket_payloads().unwrap()[0].version, FcbVersion::V3);
    }

    #[test]
    fn test_u1_rejects_validity_fields() {
        let frame = DynamicFrame::new(DynamicFormat::U1, level1());
        let err = frame.encode().unwrap_err();
        assert_eq!(
            err.field_path(),
            Some("level2SignedData.level1Data.endOfValidityYear")
        );

        let mut data = level1();
        data.end_of_validity_year = None;
        data.end_of_validity_day = None;
        let frame = DynamicFrame::new(DynamicFormat::U1, data);
        let decoded = DynamicFrame::decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded.format, DynamicFormat::U1);
    }

    #[test]
    fn test_out_of_range_key_id_has_path() {
        let mut data = level1();
        data.key_id = Some(100_000);
        let err = DynamicFrame::new(DynamicFormat::U2, data).encode().unwrap_err();
        assert_eq!(err.field_path(), Some("level2SignedData.level1Data.keyId"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut encoder = UperEncoder::new();
        encoder.encode_sequence_extension_marker(false).unwrap();
        encoder.encode_presence_bitmap(&[false]).unwrap();
        encoder.encode_ia5_string("U9", None).unwrap();
        let err = DynamicFrame::decode(&encoder.into_bytes()).unwrap_err();
        assert_eq!(err.field_path(), Some("format"));
    }

    #[test]
    fn test_copy_bits_unaligned() {
        // 0x16 0xF0 = 0001_0110 1111_0000
        let bytes = copy_bits(&[0x16, 0xF0], 3, 13).unwrap();
        assert_eq!(bytes, vec![0b1011_0111, 0b1000_0000]);
    }

    #[test]
    fn test_validation_outcomes() {
        let mut frame = DynamicFrame::new(DynamicFormat::U2, level1());
        let verifier = MockVerifier::new();
        assert_eq!(
            frame.validate_level1(&verifier, Some(&[0x04][..])),
            SignatureValidation::SignatureMissing
        );
        frame.level2_signed_data.level1_signature = Some(vec![0x30, 0x00]);
        assert_eq!(frame.validate_level1(&verifier, None), SignatureValidation::KeyMissing);

        frame.level2_signature = Some(vec![0x30, 0x00]);
        assert_eq!(frame.validate_level2(&verifier), SignatureValidation::SignedDataMissing);
        frame.level1_data_mut().level2_signing_alg = None;
        assert_eq!(frame.validate_level2(&verifier), SignatureValidation::AlgorithmMissing);
    }

    #[test]
    fn test_sign_level1_signs_level1_bytes() {
        let mut frame = DynamicFrame::new(DynamicFormat::U2, level1());
        let expected = frame.level1_data().encode(DynamicFormat::U2).unwrap();

        let mut signer = MockSigner::new();
        signer
            .expect_algorithm_oid()
            .return_const("1.2.840.10045.4.3.2".to_string());
        signer
            .expect_sign()
            .withf(move |data| data == expected.as_slice())
            .times(1)
            .returning(|_| Ok(vec![0x30, 0x00]));
        frame.sign_level1(&signer).unwrap();
        assert_eq!(frame.level2_signed_data.level1_signature, Some(vec![0x30, 0x00]));
    }

    #[test]
    fn test_level2_algorithm_locked_after_level1_signature() {
        let mut data = level1();
        data.level2_signing_alg = None;
        let mut frame = DynamicFrame::new(DynamicFormat::U2, data);
        frame.level2_signed_data.level1_signature = Some(vec![0x30, 0x00]);

        let mut signer = MockSigner::new();
        signer
            .expect_algorithm_oid()
            .return_const("1.2.840.10045.4.3.2".to_string());
        assert!(matches!(frame.sign_level2(&signer), Err(UicError::Security(_))));
    }
}
