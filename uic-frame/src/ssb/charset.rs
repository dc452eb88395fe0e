//! 6-bit character set and fixed-width field helpers of the SSB body

use uic_core::{BitBuffer, ResultExt, UicError, UicResult};

/// Characters by 6-bit code; codes 59..=63 are unassigned
const ALPHABET: &[u8; 59] = b" 0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ.-/()'+,:*&#%_=<>?!@$;";

/// Bits per character
pub const CHAR_BITS: usize = 6;

pub fn char_code(c: char) -> UicResult<u8> {
    u8::try_from(c)
        .ok()
        .and_then(|byte| ALPHABET.iter().position(|&a| a == byte))
        .map(|code| code as u8)
        .ok_or_else(|| UicError::InvalidString(format!("{:?} is not in the SSB character set", c)))
}

pub fn code_char(code: u8) -> UicResult<char> {
    ALPHABET
        .get(usize::from(code))
        .map(|&byte| char::from(byte))
        .ok_or_else(|| UicError::InvalidString(format!("Unassigned SSB character code {}", code)))
}

/// Read `count` characters, dropping trailing padding
pub(crate) fn read_chars(reader: &mut BitBuffer, count: usize, name: &str) -> UicResult<String> {
    let mut text = String::with_capacity(count);
    for _ in 0..count {
        let code = reader.get_bits(CHAR_BITS)? as u8;
        text.push(code_char(code).field(name)?);
    }
    Ok(text.trim_end().to_string())
}

/// Write `text` as exactly `count` characters, padded with spaces
pub(crate) fn write_chars(writer: &mut BitBuffer, text: &str, count: usize, name: &str) -> UicResult<()> {
    let length = text.chars().count();
    if length > count {
        return Err(UicError::InvalidLength {
            expected: count,
            actual: length,
        })
        .field(name);
    }
    for c in text.chars() {
        writer.put_bits(u64::from(char_code(c).field(name)?), CHAR_BITS)?;
    }
    for _ in length..count {
        writer.put_bits(0, CHAR_BITS)?;
    }
    Ok(())
}

/// Write an unsigned field, reporting values wider than `bits` by name
pub(crate) fn write_uint(writer: &mut BitBuffer, value: u64, bits: usize, name: &str) -> UicResult<()> {
    let max = (1u64 << bits) - 1;
    if value > max {
        return Err(UicError::ValueOutOfRange {
            value: value as i64,
            min: 0,
            max: max as i64,
        })
        .field(name);
    }
    writer.put_bits(value, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_codes() {
        assert_eq!(char_code(' ').unwrap(), 0);
        assert_eq!(char_code('0').unwrap(), 1);
        assert_eq!(char_code('A').unwrap(), 11);
        assert_eq!(char_code(';').unwrap(), 58);
        assert_eq!(code_char(36).unwrap(), 'Z');
        assert!(code_char(59).is_err());
        assert!(char_code('a').is_err());
        assert!(char_code('ü').is_err());
    }

    #[test]
    fn test_padded_text() {
        let mut writer = BitBuffer::with_capacity_bits(60);
        write_chars(&mut writer, "AB", 4, "text").unwrap();
        let bytes = writer.into_bytes();

        let mut reader = BitBuffer::from_bytes(&bytes);
        assert_eq!(read_chars(&mut reader, 4, "text").unwrap(), "AB");
        assert_eq!(reader.position(), 24);
    }

    #[test]
    fn test_trailing_spaces_are_dropped() {
        let mut writer = BitBuffer::with_capacity_bits(36);
        write_chars(&mut writer, " A  ", 6, "text").unwrap();
        let bytes = writer.into_bytes();

        let mut reader = BitBuffer::from_bytes(&bytes);
        assert_eq!(read_chars(&mut reader, 6, "text").unwrap(), " A");
    }

    #[test]
    fn test_too_long_and_too_wide() {
        let mut writer = BitBuffer::with_capacity_bits(64);
        let err = write_chars(&mut writer, "ABCDE", 4, "seat").unwrap_err();
        assert_eq!(err.field_path(), Some("seat"));

        let err = write_uint(&mut writer, 128, 7, "adults").unwrap_err();
        assert!(matches!(err.root_cause(), UicError::ValueOutOfRange { max: 127, .. }));
    }
}
