//! `U_TLAY` record: printable ticket layout
//!
//! ```text
//! standard (4) | field count (4 digits) | fields...
//! field: line (2) | column (2) | height (2) | width (2) | format (1) | length (4) | text
//! ```
//!
//! Text lengths count bytes. Version 1 records carry ISO 8859-1 text,
//! later versions UTF-8.

use super::records::{read_ascii, read_digits, write_ascii, write_digits};
use uic_core::{ResultExt, UicError, UicResult};

const FIELD_HEADER_LEN: usize = 13;

/// One positioned text field of a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub line: u8,
    pub column: u8,
    pub height: u8,
    pub width: u8,
    /// Formatting code (normal, bold, italic, ...)
    pub format: u8,
    pub text: String,
}

/// Ticket layout record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLayoutRecord {
    pub version: u8,
    /// Layout standard, e.g. `RCT2`
    pub standard: String,
    pub fields: Vec<LayoutField>,
}

fn decode_text(version: u8, bytes: &[u8]) -> UicResult<String> {
    if version == 1 {
        return Ok(bytes.iter().map(|&b| char::from(b)).collect());
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| UicError::InvalidString(format!("Invalid UTF-8: {}", e)))
}

fn encode_text(version: u8, text: &str) -> UicResult<Vec<u8>> {
    if version != 1 {
        return Ok(text.as_bytes().to_vec());
    }
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .map_err(|_| UicError::InvalidString(format!("{:?} is not ISO 8859-1", c)))
        })
        .collect()
}

fn decode_field(version: u8, content: &[u8], pos: usize) -> UicResult<(LayoutField, usize)> {
    let length = read_digits(content, pos + 9, 4, "length")?;
    let start = pos + FIELD_HEADER_LEN;
    let end = start + length;
    if end > content.len() {
        return Err(UicError::Structural(format!(
            "Field text of {} bytes overruns record",
            length
        )));
    }
    let field = LayoutField {
        line: read_digits(content, pos, 2, "line")? as u8,
        column: read_digits(content, pos + 2, 2, "column")? as u8,
        height: read_digits(content, pos + 4, 2, "height")? as u8,
        width: read_digits(content, pos + 6, 2, "width")? as u8,
        format: read_digits(content, pos + 8, 1, "format")? as u8,
        text: decode_text(version, &content[start..end])?,
    };
    Ok((field, end))
}

impl TicketLayoutRecord {
    pub fn decode_content(version: u8, content: &[u8]) -> UicResult<Self> {
        let standard = read_ascii(content, 0, 4, "standard")?.to_string();
        let count = read_digits(content, 4, 4, "field count")?;
        let mut pos = 8;
        let mut fields = Vec::with_capacity(count.min(content.len() / FIELD_HEADER_LEN));

        for index in 0..count {
            let (field, end) = decode_field(version, content, pos).field(&format!("fields[{}]", index))?;
            fields.push(field);
            pos = end;
        }

        if pos != content.len() {
            return Err(UicError::Structural(format!(
                "{} trailing bytes after layout fields",
                content.len() - pos
            )));
        }
        Ok(Self {
            version,
            standard,
            fields,
        })
    }

    pub fn encode_content(&self) -> UicResult<Vec<u8>> {
        let mut out = Vec::new();
        write_ascii(&mut out, &self.standard, 4, "standard")?;
        write_digits(&mut out, self.fields.len(), 4, "field count")?;
        for (index, field) in self.fields.iter().enumerate() {
            let path = format!("fields[{}]", index);
            let text = encode_text(self.version, &field.text).field(&path)?;
            write_digits(&mut out, usize::from(field.line), 2, "line").field(&path)?;
            write_digits(&mut out, usize::from(field.column), 2, "column").field(&path)?;
            write_digits(&mut out, usize::from(field.height), 2, "height").field(&path)?;
            write_digits(&mut out, usize::from(field.width), 2, "width").field(&path)?;
            write_digits(&mut out, usize::from(field.format), 1, "format").field(&path)?;
            write_digits(&mut out, text.len(), 4, "length").field(&path)?;
            out.extend_from_slice(&text);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_roundtrip() {
        let content = b"RCT200020102010200005Hello0307021500003Bah".to_vec();
        let layout = TicketLayoutRecord::decode_content(1, &content).unwrap();
        assert_eq!(layout.standard, "RCT2");
        assert_eq!(layout.fields.len(), 2);
        assert_eq!(layout.fields[0].text, "Hello");
        assert_eq!(layout.fields[1].line, 3);
        assert_eq!(layout.fields[1].width, 15);
        assert_eq!(layout.fields[1].text, "Bah");
        assert_eq!(layout.encode_content().unwrap(), content);
    }

    #[test]
    fn test_latin1_and_utf8_text() {
        let field = LayoutField {
            line: 0,
            column: 0,
            height: 1,
            width: 10,
            format: 0,
            text: "Zürich".to_string(),
        };
        let v1 = TicketLayoutRecord {
            version: 1,
            standard: "RCT2".to_string(),
            fields: vec![field.clone()],
        };
        let v2 = TicketLayoutRecord {
            version: 2,
            standard: "RCT2".to_string(),
            fields: vec![field],
        };
        let latin1 = v1.encode_content().unwrap();
        let utf8 = v2.encode_content().unwrap();
        assert_eq!(utf8.len(), latin1.len() + 1);
        assert_eq!(TicketLayoutRecord::decode_content(1, &latin1).unwrap(), v1);
        assert_eq!(TicketLayoutRecord::decode_content(2, &utf8).unwrap(), v2);
    }

    #[test]
    fn test_overrun_has_field_path() {
        let content = b"RCT200010102010200099Hi";
        let err = TicketLayoutRecord::decode_content(1, content).unwrap_err();
        assert_eq!(err.field_path(), Some("fields[0]"));
    }
}
