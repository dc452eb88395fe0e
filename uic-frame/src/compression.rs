//! Compression of Static Frame record data

use crate::config::FrameConfig;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use uic_core::{UicError, UicResult};

/// Compresses and decompresses frame payloads
pub trait Compressor {
    fn compress(&self, data: &[u8]) -> UicResult<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> UicResult<Vec<u8>>;
}

/// zlib (RFC 1950) compressor backed by `flate2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibCompressor {
    level: u32,
    max_size: usize,
}

impl ZlibCompressor {
    pub fn new(level: u32, max_size: usize) -> Self {
        Self {
            level: level.min(9),
            max_size,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.compression_level, config.max_decompressed_size)
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> UicResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(data)
            .map_err(|e| UicError::Compression(format!("zlib compress failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| UicError::Compression(format!("zlib compress failed: {}", e)))
    }

    fn decompress(&self, data: &[u8]) -> UicResult<Vec<u8>> {
        // One byte past the limit tells an exact fit from an overflow
        let mut decoder = ZlibDecoder::new(data).take(self.max_size as u64 + 1);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|e| UicError::Compression(format!("zlib decompress failed: {}", e)))?;
        if output.len() > self.max_size {
            return Err(UicError::Compression(format!(
                "Decompressed data exceeds {} bytes",
                self.max_size
            )));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let compressor = ZlibCompressor::default();
        let data = b"U_HEAD01005312341234567890ABCDEFGHIJ".repeat(4);
        let packed = compressor.compress(&data).unwrap();
        assert_eq!(packed[0], 0x78);
        assert_eq!(compressor.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_size_limit() {
        let packed = ZlibCompressor::default().compress(&[0u8; 1000]).unwrap();
        assert_eq!(ZlibCompressor::new(6, 1000).decompress(&packed).unwrap().len(), 1000);
        assert!(matches!(
            ZlibCompressor::new(6, 999).decompress(&packed),
            Err(UicError::Compression(_))
        ));
    }

    #[test]
    fn test_garbage_input() {
        assert!(matches!(
            ZlibCompressor::default().decompress(&[0x01, 0x02, 0x03]),
            Err(UicError::Compression(_))
        ));
    }
}
