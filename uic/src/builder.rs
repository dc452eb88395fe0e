//! Barcode builder
//!
//! # Usage Example
//!
//! ```rust
//! use uic::{BarcodeBuilder, FcbVersion, StaticVersion, TicketPayload};
//!
//! let frame = BarcodeBuilder::new()
//!     .security_provider(1080)
//!     .key_id(1)
//!     .static_version(StaticVersion::V2)
//!     .ticket(TicketPayload::new(FcbVersion::V3, vec![0x01, 0x02]))
//!     .build_static()?;
//! assert_eq!(frame.provider, "1080");
//! # Ok::<(), uic::UicError>(())
//! ```

use uic_core::{UicError, UicResult};
use uic_frame::dynamic_frame::{DataBlock, DynamicContent, DynamicFrame, Level1Data};
use uic_frame::static_frame::{DataRecord, FlexRecord, TicketLayoutRecord, UicHeaderRecord};
use uic_frame::{DynamicFormat, FrameConfig, StaticFrame, StaticVersion};
use uic_ticket::{TicketCodec, TicketPayload};

/// Builder for new Static and Dynamic Frames
///
/// Collects the issuer identity, the tickets and the frame options, then
/// produces an unsigned frame. Sign the result with the frame's own signing
/// methods.
#[derive(Debug, Clone)]
pub struct BarcodeBuilder {
    config: FrameConfig,
    /// RICS code of the security provider
    security_provider: Option<u32>,
    key_id: Option<u32>,
    tickets: Vec<TicketPayload>,
    /// Additional data blocks (Dynamic Frame)
    data_blocks: Vec<DataBlock>,
    header: Option<UicHeaderRecord>,
    layout: Option<TicketLayoutRecord>,
    dynamic_content: Option<DynamicContent>,
    /// Device key and its signing algorithm (Dynamic Frame)
    level2_key: Option<(Vec<u8>, String)>,
    /// Year, day and minute of the end of validity (`U2`)
    end_of_validity: Option<(i64, i64, i64)>,
    validity_duration: Option<i64>,
}

impl BarcodeBuilder {
    /// Create a builder with the default frame configuration
    ///
    /// # Default Settings
    /// - Static Frame version 2
    /// - Dynamic Frame format `U2`
    /// - Compression level 6
    pub fn new() -> Self {
        Self {
            config: FrameConfig::default(),
            security_provider: None,
            key_id: None,
            tickets: Vec::new(),
            data_blocks: Vec::new(),
            header: None,
            layout: None,
            dynamic_content: None,
            level2_key: None,
            end_of_validity: None,
            validity_duration: None,
        }
    }

    /// Replace the whole frame configuration
    pub fn config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn static_version(mut self, version: StaticVersion) -> Self {
        self.config.static_version = version;
        self
    }

    pub fn dynamic_format(mut self, format: DynamicFormat) -> Self {
        self.config.dynamic_format = format;
        self
    }

    /// Configure the zlib compression level (0..=9) of Static Frames
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Configure the security provider
    ///
    /// # Arguments
    /// * `rics` - RICS company code, 1..=9999 for Static Frames
    pub fn security_provider(mut self, rics: u32) -> Self {
        self.security_provider = Some(rics);
        self
    }

    /// Configure the id of the key that will sign the frame
    pub fn key_id(mut self, key_id: u32) -> Self {
        self.key_id = Some(key_id);
        self
    }

    /// Add a ticket
    ///
    /// A Static Frame carries at most one ticket, in its `U_FLEX` record.
    pub fn ticket(mut self, payload: TicketPayload) -> Self {
        self.tickets.push(payload);
        self
    }

    /// Add a ticket from a typed model, encoded through `codec`
    pub fn encoded_ticket<C: TicketCodec>(self, codec: &C, ticket: &C::Ticket) -> UicResult<Self> {
        let payload = codec.encode(ticket)?;
        Ok(self.ticket(payload))
    }

    /// Add a data block of another format to a Dynamic Frame
    pub fn data_block(mut self, block: DataBlock) -> Self {
        self.data_blocks.push(block);
        self
    }

    /// Add a `U_HEAD` record to a Static Frame
    pub fn header_record(mut self, header: UicHeaderRecord) -> Self {
        self.header = Some(header);
        self
    }

    /// Add a `U_TLAY` record to a Static Frame
    pub fn layout_record(mut self, layout: TicketLayoutRecord) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set the level 2 dynamic content of a Dynamic Frame
    pub fn dynamic_content(mut self, content: DynamicContent) -> Self {
        self.dynamic_content = Some(content);
        self
    }

    /// Configure the device key that signs level 2 of a Dynamic Frame
    ///
    /// # Arguments
    /// * `public_key` - SEC1 point or SubjectPublicKeyInfo
    /// * `signing_algorithm` - OID of the level 2 signature algorithm
    pub fn level2_key(mut self, public_key: Vec<u8>, signing_algorithm: &str) -> Self {
        self.level2_key = Some((public_key, signing_algorithm.to_string()));
        self
    }

    /// Configure the end of validity of a `U2` Dynamic Frame
    pub fn end_of_validity(mut self, year: i64, day: i64, minute: i64) -> Self {
        self.end_of_validity = Some((year, day, minute));
        self
    }

    /// Configure the validity duration in seconds of a `U2` Dynamic Frame
    pub fn validity_duration(mut self, seconds: i64) -> Self {
        self.validity_duration = Some(seconds);
        self
    }

    fn required(value: Option<u32>, what: &str) -> UicResult<u32> {
        value.ok_or_else(|| UicError::Structural(format!("{} must be configured", what)))
    }

    fn check_width(value: u32, digits: u32, what: &str) -> UicResult<String> {
        let max = 10u32.pow(digits) - 1;
        if value > max {
            return Err(UicError::ValueOutOfRange {
                value: i64::from(value),
                min: 0,
                max: i64::from(max),
            }
            .in_field(what));
        }
        Ok(format!("{:0width$}", value, width = digits as usize))
    }

    /// Build an unsigned Static Frame
    ///
    /// # Errors
    /// Returns error if:
    /// - The security provider or key id is not configured or too wide
    /// - More than one ticket was added
    /// - The configuration is invalid
    pub fn build_static(self) -> UicResult<StaticFrame> {
        self.config.validate()?;
        let provider = Self::check_width(Self::required(self.security_provider, "Security provider")?, 4, "provider")?;
        let key_id = Self::check_width(Self::required(self.key_id, "Key id")?, 5, "keyId")?;
        if self.tickets.len() > 1 {
            return Err(UicError::Structural(format!(
                "Static frame carries one ticket, {} were added",
                self.tickets.len()
            )));
        }
        if !self.data_blocks.is_empty() || self.dynamic_content.is_some() {
            return Err(UicError::Structural(
                "Data blocks and dynamic content need a Dynamic Frame".to_string(),
            ));
        }

        let mut frame = StaticFrame::from_config(&self.config, &provider, &key_id);
        if let Some(header) = self.header {
            frame.records.push(DataRecord::Header(header));
        }
        if let Some(layout) = self.layout {
            frame.records.push(DataRecord::Layout(layout));
        }
        for payload in self.tickets {
            frame.records.push(DataRecord::Flex(FlexRecord { payload }));
        }
        log::debug!(
            "Built static frame v{:02} with {} records",
            frame.version.number(),
            frame.records.len()
        );
        Ok(frame)
    }

    /// Build an unsigned Dynamic Frame
    ///
    /// Tickets come first in the data sequence, followed by the added data
    /// blocks.
    pub fn build_dynamic(self) -> UicResult<DynamicFrame> {
        self.config.validate()?;
        if self.header.is_some() || self.layout.is_some() {
            return Err(UicError::Structural(
                "Header and layout records need a Static Frame".to_string(),
            ));
        }
        let mut data_sequence: Vec<DataBlock> = self.tickets.iter().map(DataBlock::from_ticket).collect();
        data_sequence.extend(self.data_blocks);

        let (level2_public_key, level2_signing_alg) = match self.level2_key {
            Some((key, algorithm)) => (Some(key), Some(algorithm)),
            None => (None, None),
        };
        let (end_of_validity_year, end_of_validity_day, end_of_validity_time) = match self.end_of_validity {
            Some((year, day, minute)) => (Some(year), Some(day), Some(minute)),
            None => (None, None, None),
        };
        let level1 = Level1Data {
            security_provider_num: self.security_provider.map(i64::from),
            key_id: self.key_id.map(i64::from),
            data_sequence,
            level2_signing_alg,
            level2_public_key,
            end_of_validity_year,
            end_of_validity_day,
            end_of_validity_time,
            validity_duration: self.validity_duration,
            ..Level1Data::default()
        };

        let mut frame = DynamicFrame::from_config(&self.config, level1);
        if let Some(content) = &self.dynamic_content {
            frame.set_dynamic_content(content)?;
        }
        // U1 frames must not carry validity fields
        frame.level1_data().encode(frame.format)?;
        log::debug!(
            "Built dynamic frame {} with {} data blocks",
            frame.format.as_str(),
            frame.level1_data().data_sequence.len()
        );
        Ok(frame)
    }
}

impl Default for BarcodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
