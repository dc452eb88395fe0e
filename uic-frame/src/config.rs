//! Frame codec configuration

use serde::{Deserialize, Serialize};
use uic_core::{UicError, UicResult};

/// Static Frame version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticVersion {
    /// `01`: DER signature zero-padded to 50 bytes
    V1,
    /// `02`: raw `r ‖ s` signature of 64 bytes
    V2,
}

impl StaticVersion {
    /// Version number as written in the frame header
    pub fn number(&self) -> u8 {
        match self {
            StaticVersion::V1 => 1,
            StaticVersion::V2 => 2,
        }
    }

    pub fn from_number(number: u8) -> UicResult<Self> {
        match number {
            1 => Ok(StaticVersion::V1),
            2 => Ok(StaticVersion::V2),
            _ => Err(UicError::Structural(format!(
                "Unsupported static frame version: {:02}",
                number
            ))),
        }
    }

    /// Size of the signature slot in bytes
    pub fn signature_len(&self) -> usize {
        match self {
            StaticVersion::V1 => 50,
            StaticVersion::V2 => 64,
        }
    }
}

/// Dynamic Frame format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicFormat {
    U1,
    /// Adds end-of-validity fields to the level 1 data
    U2,
}

impl DynamicFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicFormat::U1 => "U1",
            DynamicFormat::U2 => "U2",
        }
    }

    pub fn from_format(format: &str) -> UicResult<Self> {
        match format {
            "U1" => Ok(DynamicFormat::U1),
            "U2" => Ok(DynamicFormat::U2),
            _ => Err(UicError::Unsupported(format!(
                "Unknown dynamic frame format: {}",
                format
            ))),
        }
    }
}

/// Configuration shared by the frame codecs
///
/// Deserializes with defaults for any missing field, so partial
/// configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Version of newly built Static Frames
    pub static_version: StaticVersion,
    /// zlib compression level (0-9)
    pub compression_level: u32,
    /// Upper bound for decompressed Static Frame data in bytes
    pub max_decompressed_size: usize,
    /// Format of newly built Dynamic Frames
    pub dynamic_format: DynamicFormat,
    /// Skip unknown SEQUENCE extension additions instead of failing
    pub skip_unknown_extensions: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            static_version: StaticVersion::V2,
            compression_level: 6,
            max_decompressed_size: 64 * 1024,
            dynamic_format: DynamicFormat::U2,
            skip_unknown_extensions: true,
        }
    }
}

impl FrameConfig {
    /// Check that every setting is usable
    pub fn validate(&self) -> UicResult<()> {
        if self.compression_level > 9 {
            return Err(UicError::ValueOutOfRange {
                value: i64::from(self.compression_level),
                min: 0,
                max: 9,
            });
        }
        if self.max_decompressed_size == 0 {
            return Err(UicError::Structural(
                "max_decompressed_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrameConfig::default();
        assert_eq!(config.static_version, StaticVersion::V2);
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.max_decompressed_size, 65536);
        assert_eq!(config.dynamic_format, DynamicFormat::U2);
        assert!(config.skip_unknown_extensions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_level() {
        let config = FrameConfig {
            compression_level: 10,
            ..FrameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_version_numbers() {
        assert_eq!(StaticVersion::from_number(1).unwrap().signature_len(), 50);
        assert_eq!(StaticVersion::from_number(2).unwrap().signature_len(), 64);
        assert!(StaticVersion::from_number(3).is_err());
        assert_eq!(DynamicFormat::from_format("U1").unwrap(), DynamicFormat::U1);
        assert!(DynamicFormat::from_format("U3").is_err());
    }
}
