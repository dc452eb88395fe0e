//! SSB header: the first 27 bits of the barcode

use super::charset::write_uint;
use uic_core::{BitBuffer, UicResult};

/// Header length in bits
pub const HEADER_BITS: usize = 27;

/// SSB header
///
/// The ticket type that completes the header is derived from the ticket
/// itself, see [`SsbTicket::ticket_type`](super::SsbTicket::ticket_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SsbHeader {
    /// Format version, 4 bits
    pub version: u8,
    /// RICS code of the issuer, 14 bits
    pub issuer: u16,
    /// Signature key id, 4 bits
    pub key_id: u8,
}

impl SsbHeader {
    pub fn new(version: u8, issuer: u16, key_id: u8) -> Self {
        Self {
            version,
            issuer,
            key_id,
        }
    }

    /// Read the header and return it with the ticket type code
    pub(crate) fn decode(reader: &mut BitBuffer) -> UicResult<(Self, u8)> {
        let version = reader.get_bits(4)? as u8;
        let issuer = reader.get_bits(14)? as u16;
        let key_id = reader.get_bits(4)? as u8;
        let ticket_type = reader.get_bits(5)? as u8;
        Ok((
            Self {
                version,
                issuer,
                key_id,
            },
            ticket_type,
        ))
    }

    pub(crate) fn encode(&self, writer: &mut BitBuffer, ticket_type: u8) -> UicResult<()> {
        write_uint(writer, u64::from(self.version), 4, "version")?;
        write_uint(writer, u64::from(self.issuer), 14, "issuer")?;
        write_uint(writer, u64::from(self.key_id), 4, "keyId")?;
        write_uint(writer, u64::from(ticket_type), 5, "ticketType")
    }
}
