//! FCB version identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uic_core::{UicError, UicResult};

/// Flexible Content Barcode data model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FcbVersion {
    V1,
    V2,
    V3,
}

impl FcbVersion {
    /// Format tag used in Dynamic Frame data blocks
    pub fn format(&self) -> &'static str {
        match self {
            FcbVersion::V1 => "FCB1",
            FcbVersion::V2 => "FCB2",
            FcbVersion::V3 => "FCB3",
        }
    }

    /// Parse a data block format tag (`"FCB1"`, `"FCB2"`, `"FCB3"`)
    pub fn from_format(format: &str) -> UicResult<Self> {
        match format {
            "FCB1" => Ok(FcbVersion::V1),
            "FCB2" => Ok(FcbVersion::V2),
            "FCB3" => Ok(FcbVersion::V3),
            _ => Err(UicError::Unsupported(format!(
                "Unknown ticket format: {}",
                format
            ))),
        }
    }

    /// Check if `format` names a ticket payload
    pub fn is_ticket_format(format: &str) -> bool {
        Self::from_format(format).is_ok()
    }

    /// Record version used by `U_FLEX` records in Static Frames
    pub fn record_version(&self) -> u8 {
        match self {
            FcbVersion::V1 => 1,
            FcbVersion::V2 => 2,
            FcbVersion::V3 => 3,
        }
    }

    /// Get the version from a `U_FLEX` record version
    pub fn from_record_version(version: u8) -> UicResult<Self> {
        match version {
            1 => Ok(FcbVersion::V1),
            2 => Ok(FcbVersion::V2),
            3 => Ok(FcbVersion::V3),
            _ => Err(UicError::Unsupported(format!(
                "Unknown U_FLEX record version: {:02}",
                version
            ))),
        }
    }
}

impl fmt::Display for FcbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_roundtrip() {
        for version in [FcbVersion::V1, FcbVersion::V2, FcbVersion::V3] {
            assert_eq!(FcbVersion::from_format(version.format()).unwrap(), version);
            assert_eq!(
                FcbVersion::from_record_version(version.record_version()).unwrap(),
                version
            );
        }
    }

    #[test]
    fn test_unknown_format() {
        assert!(FcbVersion::from_format("FDC1").is_err());
        assert!(FcbVersion::from_format("fcb3").is_err());
        assert!(!FcbVersion::is_ticket_format("TLB1"));
        assert!(FcbVersion::from_record_version(4).is_err());
    }
}
