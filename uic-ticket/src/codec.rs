//! Ticket codec seam

use crate::version::FcbVersion;
use serde::{Deserialize, Serialize};
use uic_core::{UicError, UicResult};

/// UPER-encoded ticket data together with its FCB version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPayload {
    pub version: FcbVersion,
    pub bytes: Vec<u8>,
}

impl TicketPayload {
    pub fn new(version: FcbVersion, bytes: Vec<u8>) -> Self {
        Self { version, bytes }
    }

    /// Format tag for a Dynamic Frame data block
    pub fn format(&self) -> &'static str {
        self.version.format()
    }
}

/// Build a payload from a data block format tag and its bytes
pub fn decode_payload(format: &str, bytes: &[u8]) -> UicResult<TicketPayload> {
    let version = FcbVersion::from_format(format)?;
    Ok(TicketPayload::new(version, bytes.to_vec()))
}

/// Maps ticket payloads to a typed ticket model and back
///
/// Implementations must be exact inverses so that re-encoding a decoded
/// frame reproduces its bytes.
#[cfg_attr(test, mockall::automock(type Ticket = TicketPayload;))]
pub trait TicketCodec {
    type Ticket;

    fn decode(&self, payload: &TicketPayload) -> UicResult<Self::Ticket>;

    fn encode(&self, ticket: &Self::Ticket) -> UicResult<TicketPayload>;
}

/// Codec that keeps ticket payloads as raw bytes
///
/// Optionally restricted to a set of FCB versions; payloads of any other
/// version are rejected as unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueTicketCodec {
    versions: Vec<FcbVersion>,
}

impl OpaqueTicketCodec {
    /// Codec accepting every FCB version
    pub fn new() -> Self {
        Self {
            versions: vec![FcbVersion::V1, FcbVersion::V2, FcbVersion::V3],
        }
    }

    /// Codec accepting only the given versions
    pub fn with_versions(versions: &[FcbVersion]) -> Self {
        Self {
            versions: versions.to_vec(),
        }
    }

    pub fn supports(&self, version: FcbVersion) -> bool {
        self.versions.contains(&version)
    }

    fn check(&self, version: FcbVersion) -> UicResult<()> {
        if !self.supports(version) {
            return Err(UicError::Unsupported(format!(
                "Ticket version {} not enabled",
                version
            )));
        }
        Ok(())
    }
}

impl Default for OpaqueTicketCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketCodec for OpaqueTicketCodec {
    type Ticket = TicketPayload;

    fn decode(&self, payload: &TicketPayload) -> UicResult<TicketPayload> {
        self.check(payload.version)?;
        log::trace!("Keeping {} payload of {} bytes opaque", payload.version, payload.bytes.len());
        Ok(payload.clone())
    }

    fn encode(&self, ticket: &TicketPayload) -> UicResult<TicketPayload> {
        self.check(ticket.version)?;
        Ok(ticket.clone())
    }
}
