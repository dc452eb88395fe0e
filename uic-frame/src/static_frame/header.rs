//! `U_HEAD` record: issuer and issuing metadata

use super::records::{read_ascii, read_digits, write_ascii, write_digits};
use uic_core::{UicError, UicResult};

/// Content length of a `U_HEAD` record
pub const HEADER_CONTENT_LEN: usize = 41;

/// Main UIC header record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UicHeaderRecord {
    pub version: u8,
    /// RICS code of the issuing company (4 characters)
    pub issuer: String,
    /// Unique ticket key (20 characters)
    pub identifier: String,
    /// Issuing date and time, `DDMMYYYYHHMM`
    pub issued_at: String,
    pub flags: u8,
    /// Language of the ticket (ISO 639-1)
    pub language: String,
    pub additional_language: String,
}

impl UicHeaderRecord {
    pub fn decode_content(version: u8, content: &[u8]) -> UicResult<Self> {
        if content.len() != HEADER_CONTENT_LEN {
            return Err(UicError::InvalidLength {
                expected: HEADER_CONTENT_LEN,
                actual: content.len(),
            });
        }
        Ok(Self {
            version,
            issuer: read_ascii(content, 0, 4, "issuer")?.to_string(),
            identifier: read_ascii(content, 4, 20, "identifier")?.to_string(),
            issued_at: read_ascii(content, 24, 12, "issued_at")?.to_string(),
            flags: read_digits(content, 36, 1, "flags")? as u8,
            language: read_ascii(content, 37, 2, "language")?.to_string(),
            additional_language: read_ascii(content, 39, 2, "additional_language")?.to_string(),
        })
    }

    pub fn encode_content(&self) -> UicResult<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_CONTENT_LEN);
        write_ascii(&mut out, &self.issuer, 4, "issuer")?;
        write_ascii(&mut out, &self.identifier, 20, "identifier")?;
        write_ascii(&mut out, &self.issued_at, 12, "issued_at")?;
        write_digits(&mut out, usize::from(self.flags), 1, "flags")?;
        write_ascii(&mut out, &self.language, 2, "language")?;
        write_ascii(&mut out, &self.additional_language, 2, "additional_language")?;
        Ok(out)
    }
}
