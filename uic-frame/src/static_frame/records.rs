//! Static Frame data records
//!
//! Each record is a 12-byte ASCII header followed by its content:
//!
//! ```text
//! tag (6) | version (2 digits) | length (4 digits, header included) | content
//! ```

use super::header::UicHeaderRecord;
use super::layout::TicketLayoutRecord;
use uic_core::{ResultExt, UicError, UicResult};
use uic_ticket::{FcbVersion, TicketPayload};

/// Length of the record header in bytes
pub const RECORD_HEADER_LEN: usize = 12;

pub const TAG_HEADER: &str = "U_HEAD";
pub const TAG_LAYOUT: &str = "U_TLAY";
pub const TAG_FLEX: &str = "U_FLEX";

/// Read a fixed-width ASCII field at `pos`
pub(crate) fn read_ascii<'a>(data: &'a [u8], pos: usize, len: usize, what: &str) -> UicResult<&'a str> {
    let end = pos + len;
    if end > data.len() {
        return Err(UicError::Structural(format!(
            "Not enough bytes for {}: need {}, have {}",
            what,
            len,
            data.len().saturating_sub(pos)
        )));
    }
    let bytes = &data[pos..end];
    if !bytes.is_ascii() {
        return Err(UicError::InvalidString(format!("{} is not ASCII", what)));
    }
    std::str::from_utf8(bytes).map_err(|e| UicError::InvalidString(format!("{}: {}", what, e)))
}

/// Read a fixed-width decimal number at `pos`
pub(crate) fn read_digits(data: &[u8], pos: usize, len: usize, what: &str) -> UicResult<usize> {
    let text = read_ascii(data, pos, len, what)?;
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UicError::Structural(format!(
            "{} is not numeric: {:?}",
            what, text
        )));
    }
    text.parse::<usize>()
        .map_err(|e| UicError::Structural(format!("{}: {}", what, e)))
}

/// Append a fixed-width ASCII field
pub(crate) fn write_ascii(out: &mut Vec<u8>, value: &str, len: usize, what: &str) -> UicResult<()> {
    if !value.is_ascii() {
        return Err(UicError::InvalidString(format!("{} is not ASCII", what)));
    }
    if value.len() != len {
        return Err(UicError::InvalidLength {
            expected: len,
            actual: value.len(),
        })
        .field(what);
    }
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Append a zero-padded fixed-width decimal number
pub(crate) fn write_digits(out: &mut Vec<u8>, value: usize, len: usize, what: &str) -> UicResult<()> {
    let text = format!("{:0width$}", value, width = len);
    if text.len() != len {
        return Err(UicError::ValueOutOfRange {
            value: value as i64,
            min: 0,
            max: 10i64.pow(len as u32) - 1,
        })
        .field(what);
    }
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// `U_FLEX` record: an FCB ticket in UPER encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexRecord {
    pub payload: TicketPayload,
}

/// Record with a tag this codec does not interpret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRecord {
    pub tag: String,
    pub version: u8,
    pub content: Vec<u8>,
}

/// One record of a Static Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRecord {
    Header(UicHeaderRecord),
    Layout(TicketLayoutRecord),
    Flex(FlexRecord),
    Generic(GenericRecord),
}

impl DataRecord {
    pub fn tag(&self) -> &str {
        match self {
            DataRecord::Header(_) => TAG_HEADER,
            DataRecord::Layout(_) => TAG_LAYOUT,
            DataRecord::Flex(_) => TAG_FLEX,
            DataRecord::Generic(record) => &record.tag,
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            DataRecord::Header(record) => record.version,
            DataRecord::Layout(record) => record.version,
            DataRecord::Flex(record) => record.payload.version.record_version(),
            DataRecord::Generic(record) => record.version,
        }
    }

    fn content(&self) -> UicResult<Vec<u8>> {
        match self {
            DataRecord::Header(record) => record.encode_content(),
            DataRecord::Layout(record) => record.encode_content(),
            DataRecord::Flex(record) => Ok(record.payload.bytes.clone()),
            DataRecord::Generic(record) => Ok(record.content.clone()),
        }
    }

    /// Encode the record including its 12-byte header
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let tag = self.tag().to_string();
        let content = self.content().field(&tag)?;
        let mut out = Vec::with_capacity(RECORD_HEADER_LEN + content.len());
        write_ascii(&mut out, &tag, 6, "tag")?;
        write_digits(&mut out, usize::from(self.version()), 2, "version").field(&tag)?;
        write_digits(&mut out, RECORD_HEADER_LEN + content.len(), 4, "length").field(&tag)?;
        out.extend_from_slice(&content);
        Ok(out)
    }

    /// Decode one record from the front of `data`
    ///
    /// Returns the record and the number of bytes it occupied.
    pub fn decode(data: &[u8]) -> UicResult<(Self, usize)> {
        let tag = read_ascii(data, 0, 6, "record tag")?.to_string();
        let version = read_digits(data, 6, 2, "record version").field(&tag)? as u8;
        let length = read_digits(data, 8, 4, "record length").field(&tag)?;
        if length < RECORD_HEADER_LEN || length > data.len() {
            return Err(UicError::Structural(format!(
                "Record {} declares {} bytes, {} available",
                tag,
                length,
                data.len()
            )));
        }
        let content = &data[RECORD_HEADER_LEN..length];
        log::trace!("Record {} v{:02}: {} content bytes", tag, version, content.len());

        let record = match tag.as_str() {
            TAG_HEADER => DataRecord::Header(UicHeaderRecord::decode_content(version, content).field(&tag)?),
            TAG_LAYOUT => {
                DataRecord::Layout(TicketLayoutRecord::decode_content(version, content).field(&tag)?)
            }
            TAG_FLEX => {
                let fcb = FcbVersion::from_record_version(version).field(&tag)?;
                DataRecord::Flex(FlexRecord {
                    payload: TicketPayload::new(fcb, content.to_vec()),
                })
            }
            _ => DataRecord::Generic(GenericRecord {
                tag,
                version,
                content: content.to_vec(),
            }),
        };
        Ok((record, length))
    }
}

/// Decode every record of the decompressed frame data
pub fn decode_records(data: &[u8]) -> UicResult<Vec<DataRecord>> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (record, length) = DataRecord::decode(&data[pos..]).field(&format!("records[{}]", records.len()))?;
        records.push(record);
        pos += length;
    }
    Ok(records)
}

/// Concatenate the encodings of `records`
pub fn encode_records(records: &[DataRecord]) -> UicResult<Vec<u8>> {
    let mut out = Vec::new();
    for (index, record) in records.iter().enumerate() {
        out.extend_from_slice(&record.encode().field(&format!("records[{}]", index))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_record_roundtrip() {
        let data = b"0080BL03001712345".to_vec();
        let (record, length) = DataRecord::decode(&data).unwrap();
        assert_eq!(length, 17);
        assert_eq!(
            record,
            DataRecord::Generic(GenericRecord {
                tag: "0080BL".to_string(),
                version: 3,
                content: b"12345".to_vec(),
            })
        );
        assert_eq!(record.encode().unwrap(), data);
    }

    #[test]
    fn test_flex_record_version() {
        let data = b"U_FLEX030014\x01\x02".to_vec();
        let (record, _) = DataRecord::decode(&data).unwrap();
        match &record {
            DataRecord::Flex(flex) => {
                assert_eq!(flex.payload.version, FcbVersion::V3);
                assert_eq!(flex.payload.bytes, vec![0x01, 0x02]);
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(record.encode().unwrap(), data);
    }

    #[test]
    fn test_declared_length_overrun() {
        let data = b"0080BL010020abc";
        let err = DataRecord::decode(data).unwrap_err();
        assert!(matches!(err, UicError::Structural(_)));
    }

    #[test]
    fn test_declared_length_below_header() {
        assert!(DataRecord::decode(b"0080BL010011").is_err());
    }

    #[test]
    fn test_non_numeric_length() {
        let err = DataRecord::decode(b"0080BL01001Xabc").unwrap_err();
        assert_eq!(err.field_path(), Some("0080BL"));
    }

    #[test]
    fn test_records_sequence() {
        let data = b"AAAAAA010013xBBBBBB010012".to_vec();
        let records = decode_records(&data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tag(), "BBBBBB");
        assert_eq!(encode_records(&records).unwrap(), data);
    }

    #[test]
    fn test_digits_width() {
        let mut out = Vec::new();
        assert!(write_digits(&mut out, 10_000, 4, "length").is_err());
        write_digits(&mut out, 7, 4, "length").unwrap();
        assert_eq!(out, b"0007");
    }
}
