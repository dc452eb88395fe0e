//! UPER decoder for ASN.1 structures
//!
//! # Usage Example
//!
//! ```rust
//! use uic_asn1::uper::UperDecoder;
//!
//! let mut decoder = UperDecoder::new(&[0x08]);
//! assert_eq!(decoder.decode_constrained_int(2016, 2269, false)?, 2024);
//! # Ok::<(), uic_core::UicError>(())
//! ```

use crate::uper::types::{
    bits_for_range, oid_from_bytes, signed_from_bytes, unsigned_from_bytes, SizeConstraint,
};
use uic_core::{BitBuffer, UicError, UicResult};

/// UPER decoder
///
/// Reads values in the exact order they were written by
/// [`UperEncoder`](crate::uper::UperEncoder). The decoder owns its own
/// [`BitBuffer`], so independent decoders never share state.
///
/// # Error Handling
///
/// Truncated input surfaces as `BufferUnderflow`; values outside their
/// declared constraint as `ValueOutOfRange`, `InvalidChoiceIndex` or
/// `InvalidEnumerated`. Callers attach the field path with
/// [`ResultExt::field`](uic_core::ResultExt::field).
pub struct UperDecoder {
    buffer: BitBuffer,
}

impl UperDecoder {
    /// Create a new decoder over a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            buffer: BitBuffer::from_bytes(data),
        }
    }

    /// Current position in bits
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Bits left to read, including trailing padding
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Number of whole octets touched so far
    pub fn consumed_bytes(&self) -> usize {
        self.buffer.position().div_ceil(8)
    }

    pub fn decode_bit(&mut self) -> UicResult<bool> {
        self.buffer.get_bit()
    }

    pub fn decode_bits(&mut self, count: usize) -> UicResult<u64> {
        self.buffer.get_bits(count)
    }

    /// Decode a BOOLEAN, `1 = true`
    pub fn decode_boolean(&mut self) -> UicResult<bool> {
        self.buffer.get_bit()
    }

    /// Decode the extension bit of an extensible SEQUENCE
    pub fn decode_sequence_extension_marker(&mut self) -> UicResult<bool> {
        self.buffer.get_bit()
    }

    /// Decode `count` presence bits in declaration order
    pub fn decode_presence_bitmap(&mut self, count: usize) -> UicResult<Vec<bool>> {
        (0..count).map(|_| self.buffer.get_bit()).collect()
    }

    fn decode_constrained_whole_number(&mut self, min: i64, max: i64) -> UicResult<i64> {
        let offset = self.buffer.get_bits(bits_for_range(min, max))?;
        let value = i128::from(min) + i128::from(offset);
        if value > i128::from(max) {
            return Err(UicError::ValueOutOfRange {
                value: value.min(i128::from(i64::MAX)) as i64,
                min,
                max,
            });
        }
        Ok(value as i64)
    }

    /// Decode a constrained INTEGER in `[min, max]`
    ///
    /// With an extension marker, a set leading bit means the value lies
    /// outside the root range and follows as an unconstrained whole number.
    pub fn decode_constrained_int(
        &mut self,
        min: i64,
        max: i64,
        has_extension_marker: bool,
    ) -> UicResult<i64> {
        if min > max {
            return Err(UicError::Structural(format!(
                "Invalid constraint: {}..={}",
                min, max
            )));
        }
        if has_extension_marker && self.buffer.get_bit()? {
            return self.decode_unconstrained_integer();
        }
        self.decode_constrained_whole_number(min, max)
    }

    /// Decode an unconstrained INTEGER: length determinant + two's complement
    pub fn decode_unconstrained_integer(&mut self) -> UicResult<i64> {
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        signed_from_bytes(&bytes)
    }

    /// Decode a semi-constrained INTEGER (`min..MAX`)
    pub fn decode_semi_constrained_integer(&mut self, min: i64) -> UicResult<i64> {
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        let offset = unsigned_from_bytes(&bytes)?;
        let value = i128::from(min) + i128::from(offset);
        if value > i128::from(i64::MAX) {
            return Err(UicError::ValueOutOfRange {
                value: i64::MAX,
                min,
                max: i64::MAX,
            });
        }
        Ok(value as i64)
    }

    /// Decode a normally small non-negative whole number (X.691 10.6)
    pub fn decode_normally_small(&mut self) -> UicResult<u64> {
        if !self.buffer.get_bit()? {
            return self.buffer.get_bits(6);
        }
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        unsigned_from_bytes(&bytes)
    }

    fn decode_extensible_index(
        &mut self,
        root_count: usize,
        has_extension_marker: bool,
    ) -> UicResult<Option<usize>> {
        if root_count == 0 {
            return Err(UicError::Structural("Empty alternative list".to_string()));
        }
        if has_extension_marker && self.buffer.get_bit()? {
            let n = self.decode_normally_small()?;
            let index = usize::try_from(n)
                .ok()
                .and_then(|n| n.checked_add(root_count))
                .ok_or_else(|| UicError::Unsupported(format!("Extension index {} too large", n)))?;
            return Ok(Some(index));
        }
        Ok(None)
    }

    /// Decode an ENUMERATED index
    ///
    /// Returned indices at or beyond `root_count` denote extension values.
    pub fn decode_enumerated(&mut self, root_count: usize, has_extension_marker: bool) -> UicResult<usize> {
        if let Some(index) = self.decode_extensible_index(root_count, has_extension_marker)? {
            return Ok(index);
        }
        let max = root_count - 1;
        let index = self.buffer.get_bits(bits_for_range(0, max as i64))? as usize;
        if index > max {
            return Err(UicError::InvalidEnumerated { index, max });
        }
        Ok(index)
    }

    /// Decode the index of the selected CHOICE alternative
    ///
    /// Indices at or beyond `root_count` denote extension alternatives whose
    /// value follows as an open type.
    pub fn decode_choice_index(&mut self, root_count: usize, has_extension_marker: bool) -> UicResult<usize> {
        if let Some(index) = self.decode_extensible_index(root_count, has_extension_marker)? {
            return Ok(index);
        }
        let max = root_count - 1;
        let index = self.buffer.get_bits(bits_for_range(0, max as i64))? as usize;
        if index > max {
            return Err(UicError::InvalidChoiceIndex { index, max });
        }
        Ok(index)
    }

    /// Decode an unconstrained length determinant (X.691 11.9)
    pub fn decode_length_determinant(&mut self) -> UicResult<usize> {
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(7)? as usize);
        }
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(14)? as usize);
        }
        Err(UicError::Unsupported(
            "Fragmented length determinant".to_string(),
        ))
    }

    fn decode_normally_small_length(&mut self) -> UicResult<usize> {
        if !self.buffer.get_bit()? {
            return Ok(self.buffer.get_bits(6)? as usize + 1);
        }
        self.decode_length_determinant()
    }

    fn decode_length(&mut self, size: Option<SizeConstraint>) -> UicResult<usize> {
        match size {
            Some(constraint) if constraint.is_fixed() => Ok(constraint.min),
            Some(constraint) if constraint.uses_constrained_length() => {
                let length =
                    self.decode_constrained_whole_number(constraint.min as i64, constraint.max as i64)?;
                Ok(length as usize)
            }
            Some(constraint) => {
                let length = self.decode_length_determinant()?;
                constraint.check(length)?;
                Ok(length)
            }
            None => self.decode_length_determinant(),
        }
    }

    fn check_available(&self, items: usize, bits_per_item: usize) -> UicResult<()> {
        let needed = items.saturating_mul(bits_per_item);
        if needed > self.buffer.remaining() {
            return Err(UicError::BufferUnderflow {
                needed,
                available: self.buffer.remaining(),
            });
        }
        Ok(())
    }

    /// Decode an IA5String of 7-bit characters
    pub fn decode_ia5_string(&mut self, size: Option<SizeConstraint>) -> UicResult<String> {
        let length = self.decode_length(size)?;
        self.check_available(length, 7)?;
        let mut value = String::with_capacity(length);
        for _ in 0..length {
            value.push(char::from(self.buffer.get_bits(7)? as u8));
        }
        Ok(value)
    }

    /// Decode a UTF8String whose length determinant counts octets
    pub fn decode_utf8_string(&mut self) -> UicResult<String> {
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        String::from_utf8(bytes).map_err(|e| UicError::InvalidString(format!("Invalid UTF-8: {}", e)))
    }

    /// Decode an OCTET STRING
    pub fn decode_octet_string(&mut self, size: Option<SizeConstraint>) -> UicResult<Vec<u8>> {
        let length = self.decode_length(size)?;
        self.buffer.get_bytes(length)
    }

    /// Decode a BIT STRING
    pub fn decode_bit_string(&mut self, size: Option<SizeConstraint>) -> UicResult<Vec<bool>> {
        let length = self.decode_length(size)?;
        self.check_available(length, 1)?;
        (0..length).map(|_| self.buffer.get_bit()).collect()
    }

    /// Decode an OBJECT IDENTIFIER into dotted notation
    pub fn decode_object_identifier(&mut self) -> UicResult<String> {
        let length = self.decode_length_determinant()?;
        let bytes = self.buffer.get_bytes(length)?;
        oid_from_bytes(&bytes)
    }

    /// Decode an open type and return its encoded octets
    pub fn decode_open_type(&mut self) -> UicResult<Vec<u8>> {
        let length = self.decode_length_determinant()?;
        self.buffer.get_bytes(length)
    }

    /// Skip the extension additions of an extensible SEQUENCE
    ///
    /// Call after the root fields when the extension bit was set. Returns the
    /// number of additions skipped.
    pub fn skip_sequence_extensions(&mut self) -> UicResult<usize> {
        let count = self.decode_normally_small_length()?;
        let present = self.decode_presence_bitmap(count)?;
        let mut skipped = 0;
        for bit in present {
            if bit {
                self.decode_open_type()?;
                skipped += 1;
            }
        }
        Ok(skipped)
    }

    /// Decode a SEQUENCE OF with the supplied element decoder
    pub fn decode_sequence_of<T, F>(
        &mut self,
        size: Option<SizeConstraint>,
        mut decode_element: F,
    ) -> UicResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> UicResult<T>,
    {
        let count = self.decode_length(size)?;
        let mut items = Vec::with_capacity(count.min(self.buffer.remaining()));
        for _ in 0..count {
            items.push(decode_element(self)?);
        }
        Ok(items)
    }

    /// Decode a SEQUENCE OF constrained INTEGER
    pub fn decode_sequence_of_int(
        &mut self,
        size: Option<SizeConstraint>,
        min: i64,
        max: i64,
    ) -> UicResult<Vec<i64>> {
        self.decode_sequence_of(size, |decoder| decoder.decode_constrained_int(min, max, false))
    }
}
