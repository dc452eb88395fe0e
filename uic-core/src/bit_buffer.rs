//! Bit-addressable buffer for UIC barcode encoding
//!
//! All multi-bit values are read and written most-significant bit first,
//! which is the bit order of ASN.1 UPER and of the SSB bit layout.
//!
//! # Usage Example
//!
//! ```rust
//! use uic_core::BitBuffer;
//!
//! let mut writer = BitBuffer::with_capacity_bits(16);
//! writer.put_bits(0b101, 3)?;
//! writer.put_bit(true)?;
//! let bytes = writer.into_bytes();
//! assert_eq!(bytes, vec![0b1011_0000]);
//!
//! let mut reader = BitBuffer::from_bytes(&bytes);
//! assert_eq!(reader.get_bits(3)?, 0b101);
//! assert!(reader.get_bit()?);
//! # Ok::<(), uic_core::UicError>(())
//! ```

use crate::error::{UicError, UicResult};

/// Fixed-capacity bit cursor over a byte sequence
///
/// One instance serves one encode or decode operation. The cursor only moves
/// forward during normal use; `seek` exists for layouts with fixed offsets
/// such as the SSB signature region.
///
/// # Capacity
///
/// Capacity is fixed at construction. Any request that would move the
/// cursor past it fails with `BufferUnderflow` (reads) or `BufferOverflow`
/// (writes). Storage for writers is allocated as bits are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer {
    data: Vec<u8>,
    capacity_bits: usize,
    position: usize,
    high_water: usize,
}

impl BitBuffer {
    /// Create a reader over a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            capacity_bits: bytes.len() * 8,
            position: 0,
            high_water: bytes.len() * 8,
        }
    }

    /// Create an empty writer that accepts at most `capacity_bits` bits
    pub fn with_capacity_bits(capacity_bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity_bits.div_ceil(8).min(4096)),
            capacity_bits,
            position: 0,
            high_water: 0,
        }
    }

    /// Create a zero-filled buffer of exactly `len` bytes
    ///
    /// Used for fixed-size layouts where fields are written at known offsets.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0u8; len],
            capacity_bits: len * 8,
            position: 0,
            high_water: len * 8,
        }
    }

    /// Current cursor position in bits
    pub fn position(&self) -> usize {
        self.position
    }

    /// Capacity in bits
    pub fn capacity(&self) -> usize {
        self.capacity_bits
    }

    /// Bits left between the cursor and the capacity
    pub fn remaining(&self) -> usize {
        self.capacity_bits - self.position
    }

    /// Move the cursor to an absolute bit position
    ///
    /// A position past the capacity means the data ends before it and
    /// fails with `BufferUnderflow`.
    pub fn seek(&mut self, position: usize) -> UicResult<()> {
        if position > self.capacity_bits {
            return Err(UicError::BufferUnderflow {
                needed: position - self.position,
                available: self.remaining(),
            });
        }
        self.position = position;
        Ok(())
    }

    fn check_read(&self, bits: usize) -> UicResult<()> {
        if bits > self.remaining() {
            return Err(UicError::BufferUnderflow {
                needed: bits,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn check_write(&self, bits: usize) -> UicResult<()> {
        if bits > self.remaining() {
            return Err(UicError::BufferOverflow {
                needed: bits,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn bit_at(&self, index: usize) -> bool {
        match self.data.get(index / 8) {
            Some(byte) => (byte >> (7 - (index % 8))) & 1 == 1,
            None => false,
        }
    }

    fn set_bit_at(&mut self, index: usize, bit: bool) {
        let octet = index / 8;
        if octet >= self.data.len() {
            self.data.resize(octet + 1, 0);
        }
        let mask = 1u8 << (7 - (index % 8));
        if bit {
            self.data[octet] |= mask;
        } else {
            self.data[octet] &= !mask;
        }
    }

    /// Read one bit
    pub fn get_bit(&mut self) -> UicResult<bool> {
        self.check_read(1)?;
        let bit = self.bit_at(self.position);
        self.position += 1;
        Ok(bit)
    }

    /// Read `n` bits (at most 64) as an unsigned big-endian value
    pub fn get_bits(&mut self, n: usize) -> UicResult<u64> {
        if n > 64 {
            return Err(UicError::Unsupported(format!(
                "cannot read {} bits into a 64-bit value",
                n
            )));
        }
        self.check_read(n)?;
        let mut value = 0u64;
        for i in 0..n {
            value = (value << 1) | u64::from(self.bit_at(self.position + i));
        }
        self.position += n;
        Ok(value)
    }

    /// Read `count` whole octets starting at the cursor (no alignment required)
    pub fn get_bytes(&mut self, count: usize) -> UicResult<Vec<u8>> {
        self.check_read(count * 8)?;
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.get_bits(8)? as u8);
        }
        Ok(bytes)
    }

    /// Write one bit
    pub fn put_bit(&mut self, bit: bool) -> UicResult<()> {
        self.check_write(1)?;
        self.set_bit_at(self.position, bit);
        self.position += 1;
        self.high_water = self.high_water.max(self.position);
        Ok(())
    }

    /// Write the low `n` bits (at most 64) of `value`, most significant first
    ///
    /// Bits of `value` above `n` must be zero; a value that does not fit is
    /// rejected rather than silently truncated.
    pub fn put_bits(&mut self, value: u64, n: usize) -> UicResult<()> {
        if n > 64 {
            return Err(UicError::Unsupported(format!(
                "cannot write {} bits from a 64-bit value",
                n
            )));
        }
        if n < 64 && value >> n != 0 {
            return Err(UicError::ValueOutOfRange {
                value: value.min(i64::MAX as u64) as i64,
                min: 0,
                max: ((1u64 << n) - 1) as i64,
            });
        }
        self.check_write(n)?;
        for i in (0..n).rev() {
            self.set_bit_at(self.position, (value >> i) & 1 == 1);
            self.position += 1;
        }
        self.high_water = self.high_water.max(self.position);
        Ok(())
    }

    /// Write whole octets starting at the cursor
    pub fn put_bytes(&mut self, bytes: &[u8]) -> UicResult<()> {
        self.check_write(bytes.len() * 8)?;
        for &byte in bytes {
            self.put_bits(u64::from(byte), 8)?;
        }
        Ok(())
    }

    /// Advance the cursor to the next multiple of 8 bits
    ///
    /// When writing, the skipped bits are zero. No-op if already aligned.
    pub fn align_to_byte(&mut self) -> UicResult<()> {
        let padding = (8 - self.position % 8) % 8;
        if padding == 0 {
            return Ok(());
        }
        if padding > self.remaining() {
            return Err(UicError::BufferUnderflow {
                needed: padding,
                available: self.remaining(),
            });
        }
        for _ in 0..padding {
            let index = self.position;
            if index / 8 >= self.data.len() {
                self.set_bit_at(index, false);
            }
            self.position += 1;
        }
        self.high_water = self.high_water.max(self.position);
        Ok(())
    }

    /// Written content, rounded up to whole octets
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.high_water.div_ceil(8).min(self.data.len());
        &self.data[..len]
    }

    /// Consume the buffer and return its content rounded up to whole octets
    ///
    /// Trailing bits of the last octet are zero.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.high_water.div_ceil(8);
        self.data.resize(len, 0);
        self.data
    }
}
