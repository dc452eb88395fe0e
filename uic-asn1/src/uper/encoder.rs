//! UPER encoder for ASN.1 structures
//!
//! # Usage Example
//!
//! ```rust
//! use uic_asn1::uper::UperEncoder;
//!
//! let mut encoder = UperEncoder::new();
//! encoder.encode_constrained_int(2024, 2016, 2269, false)?;
//! assert_eq!(encoder.into_bytes(), vec![0x08]);
//! # Ok::<(), uic_core::UicError>(())
//! ```

use crate::uper::types::{
    bits_for_range, oid_to_bytes, signed_bytes, unsigned_bytes, SizeConstraint,
    MAX_UNFRAGMENTED_LENGTH,
};
use uic_core::{BitBuffer, UicError, UicResult};

/// Default encoder capacity: 128 KiB, far above any barcode payload
pub const DEFAULT_CAPACITY_BITS: usize = 128 * 1024 * 8;

/// UPER encoder
///
/// Writes values bit by bit with no alignment between fields, following
/// ITU-T X.691 unaligned variant. Every `encode_*` operation has a matching
/// `decode_*` operation on [`UperDecoder`](crate::uper::UperDecoder).
///
/// # Error Handling
///
/// Values violating their declared constraint are rejected with
/// `ValueOutOfRange`, `InvalidChoiceIndex` or `InvalidEnumerated`; nothing is
/// written for a rejected value.
pub struct UperEncoder {
    buffer: BitBuffer,
}

impl UperEncoder {
    /// Create a new encoder with the default capacity
    pub fn new() -> Self {
        Self::with_capacity_bits(DEFAULT_CAPACITY_BITS)
    }

    /// Create a new encoder accepting at most `capacity_bits` bits
    pub fn with_capacity_bits(capacity_bits: usize) -> Self {
        Self {
            buffer: BitBuffer::with_capacity_bits(capacity_bits),
        }
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.buffer.position()
    }

    /// Encoded bytes; the final octet is padded with zero bits
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    pub fn encode_bit(&mut self, bit: bool) -> UicResult<()> {
        self.buffer.put_bit(bit)
    }

    pub fn encode_bits(&mut self, value: u64, count: usize) -> UicResult<()> {
        self.buffer.put_bits(value, count)
    }

    /// Encode a BOOLEAN as a single bit, `1 = true`
    pub fn encode_boolean(&mut self, value: bool) -> UicResult<()> {
        self.buffer.put_bit(value)
    }

    /// Encode the extension bit of an extensible SEQUENCE
    ///
    /// This encoder never emits extension additions, so callers pass `false`
    /// unless they also write the additions themselves.
    pub fn encode_sequence_extension_marker(&mut self, present: bool) -> UicResult<()> {
        self.buffer.put_bit(present)
    }

    /// Encode one presence bit per OPTIONAL/DEFAULT field, in declaration order
    pub fn encode_presence_bitmap(&mut self, bits: &[bool]) -> UicResult<()> {
        for &bit in bits {
            self.buffer.put_bit(bit)?;
        }
        Ok(())
    }

    fn encode_constrained_whole_number(&mut self, value: i64, min: i64, max: i64) -> UicResult<()> {
        if value < min || value > max {
            return Err(UicError::ValueOutOfRange { value, min, max });
        }
        let offset = (i128::from(value) - i128::from(min)) as u64;
        self.buffer.put_bits(offset, bits_for_range(min, max))
    }

    /// Encode a constrained INTEGER in `[min, max]`
    ///
    /// With an extension marker, an extra leading bit tells whether the value
    /// lies in the root range; values outside it are written as unconstrained
    /// whole numbers (X.691 12.1).
    pub fn encode_constrained_int(
        &mut self,
        value: i64,
        min: i64,
        max: i64,
        has_extension_marker: bool,
    ) -> UicResult<()> {
        if min > max {
            return Err(UicError::Structural(format!(
                "Invalid constraint: {}..={}",
                min, max
            )));
        }
        if has_extension_marker {
            let in_root = value >= min && value <= max;
            self.buffer.put_bit(!in_root)?;
            if !in_root {
                return self.encode_unconstrained_integer(value);
            }
        }
        self.encode_constrained_whole_number(value, min, max)
    }

    /// Encode an unconstrained INTEGER: length determinant + minimal two's complement
    pub fn encode_unconstrained_integer(&mut self, value: i64) -> UicResult<()> {
        let bytes = signed_bytes(value);
        self.encode_length_determinant(bytes.len())?;
        self.buffer.put_bytes(&bytes)
    }

    /// Encode a semi-constrained INTEGER (`min..MAX`) as its offset from `min`
    pub fn encode_semi_constrained_integer(&mut self, value: i64, min: i64) -> UicResult<()> {
        if value < min {
            return Err(UicError::ValueOutOfRange {
                value,
                min,
                max: i64::MAX,
            });
        }
        let offset = (i128::from(value) - i128::from(min)) as u64;
        let bytes = unsigned_bytes(offset);
        self.encode_length_determinant(bytes.len())?;
        self.buffer.put_bytes(&bytes)
    }

    /// Encode a normally small non-negative whole number (X.691 10.6)
    pub fn encode_normally_small(&mut self, value: u64) -> UicResult<()> {
        if value <= 63 {
            self.buffer.put_bit(false)?;
            self.buffer.put_bits(value, 6)
        } else {
            self.buffer.put_bit(true)?;
            let bytes = unsigned_bytes(value);
            self.encode_length_determinant(bytes.len())?;
            self.buffer.put_bytes(&bytes)
        }
    }

    fn encode_extensible_index(
        &mut self,
        index: usize,
        root_count: usize,
        has_extension_marker: bool,
    ) -> UicResult<bool> {
        if root_count == 0 {
            return Err(UicError::Structural("Empty alternative list".to_string()));
        }
        if has_extension_marker {
            let in_root = index < root_count;
            self.buffer.put_bit(!in_root)?;
            if !in_root {
                self.encode_normally_small((index - root_count) as u64)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Encode an ENUMERATED index among `root_count` root values
    pub fn encode_enumerated(
        &mut self,
        index: usize,
        root_count: usize,
        has_extension_marker: bool,
    ) -> UicResult<()> {
        if !has_extension_marker && index >= root_count {
            return Err(UicError::InvalidEnumerated {
                index,
                max: root_count.saturating_sub(1),
            });
        }
        if self.encode_extensible_index(index, root_count, has_extension_marker)? {
            return Ok(());
        }
        self.encode_constrained_whole_number(index as i64, 0, root_count as i64 - 1)
    }

    /// Encode the selected alternative of a CHOICE
    ///
    /// The alternative's value is written by the caller afterwards. Indices at
    /// or beyond `root_count` are extension alternatives and must be followed
    /// by an open type.
    pub fn encode_choice_index(
        &mut self,
        index: usize,
        root_count: usize,
        has_extension_marker: bool,
    ) -> UicResult<()> {
        if !has_extension_marker && index >= root_count {
            return Err(UicError::InvalidChoiceIndex {
                index,
                max: root_count.saturating_sub(1),
            });
        }
        if self.encode_extensible_index(index, root_count, has_extension_marker)? {
            return Ok(());
        }
        self.encode_constrained_whole_number(index as i64, 0, root_count as i64 - 1)
    }

    /// Encode an unconstrained length determinant (X.691 11.9)
    ///
    /// - `0..=127`: one octet, top bit clear
    /// - `128..=16383`: two octets, `10` prefix
    ///
    /// Fragmented lengths are not needed for barcode payloads and are rejected.
    pub fn encode_length_determinant(&mut self, length: usize) -> UicResult<()> {
        if length <= 127 {
            self.buffer.put_bits(length as u64, 8)
        } else if length <= MAX_UNFRAGMENTED_LENGTH {
            self.buffer.put_bits(0x8000 | length as u64, 16)
        } else {
            Err(UicError::Unsupported(format!(
                "Fragmented length determinant ({} > {})",
                length, MAX_UNFRAGMENTED_LENGTH
            )))
        }
    }

    fn encode_length(&mut self, length: usize, size: Option<SizeConstraint>) -> UicResult<()> {
        match size {
            Some(constraint) => {
                constraint.check(length)?;
                if constraint.is_fixed() {
                    Ok(())
                } else if constraint.uses_constrained_length() {
                    self.encode_constrained_whole_number(
                        length as i64,
                        constraint.min as i64,
                        constraint.max as i64,
                    )
                } else {
                    self.encode_length_determinant(length)
                }
            }
            None => self.encode_length_determinant(length),
        }
    }

    /// Encode an IA5String as 7-bit characters
    pub fn encode_ia5_string(&mut self, value: &str, size: Option<SizeConstraint>) -> UicResult<()> {
        if let Some(c) = value.chars().find(|c| !c.is_ascii()) {
            return Err(UicError::InvalidString(format!(
                "Character {:?} is not IA5",
                c
            )));
        }
        self.encode_length(value.len(), size)?;
        for byte in value.bytes() {
            self.buffer.put_bits(u64::from(byte), 7)?;
        }
        Ok(())
    }

    /// Encode a UTF8String; the length counts octets, not characters
    pub fn encode_utf8_string(&mut self, value: &str) -> UicResult<()> {
        self.encode_length_determinant(value.len())?;
        self.buffer.put_bytes(value.as_bytes())
    }

    /// Encode an OCTET STRING
    ///
    /// Fixed sizes carry no length; size ranges carry the length in the
    /// minimum number of bits for the range.
    pub fn encode_octet_string(&mut self, value: &[u8], size: Option<SizeConstraint>) -> UicResult<()> {
        self.encode_length(value.len(), size)?;
        self.buffer.put_bytes(value)
    }

    /// Encode a BIT STRING
    pub fn encode_bit_string(&mut self, bits: &[bool], size: Option<SizeConstraint>) -> UicResult<()> {
        self.encode_length(bits.len(), size)?;
        for &bit in bits {
            self.buffer.put_bit(bit)?;
        }
        Ok(())
    }

    /// Encode an OBJECT IDENTIFIER given in dotted notation
    pub fn encode_object_identifier(&mut self, oid: &str) -> UicResult<()> {
        let bytes = oid_to_bytes(oid)?;
        self.encode_length_determinant(bytes.len())?;
        self.buffer.put_bytes(&bytes)
    }

    /// Encode an open type: already encoded octets behind a length determinant
    pub fn encode_open_type(&mut self, encoded: &[u8]) -> UicResult<()> {
        self.encode_length_determinant(encoded.len())?;
        self.buffer.put_bytes(encoded)
    }

    /// Encode a SEQUENCE OF with the supplied element encoder
    pub fn encode_sequence_of<T, F>(
        &mut self,
        items: &[T],
        size: Option<SizeConstraint>,
        mut encode_element: F,
    ) -> UicResult<()>
    where
        F: FnMut(&mut Self, &T) -> UicResult<()>,
    {
        self.encode_length(items.len(), size)?;
        for item in items {
            encode_element(self, item)?;
        }
        Ok(())
    }

    /// Encode a SEQUENCE OF constrained INTEGER
    pub fn encode_sequence_of_int(
        &mut self,
        values: &[i64],
        size: Option<SizeConstraint>,
        min: i64,
        max: i64,
    ) -> UicResult<()> {
        self.encode_sequence_of(values, size, |encoder, &value| {
            encoder.encode_constrained_int(value, min, max, false)
        })
    }
}

impl Default for UperEncoder {
    fn default() -> Self {
        Self::new()
    }
}
