//! Dynamic content data (`FDC1`)
//!
//! Carried as the level 2 data of a Dynamic Frame. Holds data produced at
//! presentation time: a time stamp, the device position and challenge
//! responses.

use super::finish_extensions;
use crate::config::FrameConfig;
use uic_asn1::{UperDecoder, UperEncoder};
use uic_core::{ResultExt, UicResult};

/// Data block format of dynamic content
pub const FORMAT: &str = "FDC1";

trait Enumerated: Copy + PartialEq + 'static {
    const VARIANTS: &'static [Self];

    fn encode(self, encoder: &mut UperEncoder) -> UicResult<()> {
        let index = Self::VARIANTS.iter().position(|v| *v == self).unwrap_or(0);
        encoder.encode_enumerated(index, Self::VARIANTS.len(), false)
    }

    fn decode(decoder: &mut UperDecoder) -> UicResult<Self> {
        let index = decoder.decode_enumerated(Self::VARIANTS.len(), false)?;
        Ok(Self::VARIANTS[index])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoUnit {
    MicroDegree,
    TenthMilliDegree,
    #[default]
    MilliDegree,
    CentiDegree,
    DeciDegree,
}

impl Enumerated for GeoUnit {
    const VARIANTS: &'static [Self] = &[
        GeoUnit::MicroDegree,
        GeoUnit::TenthMilliDegree,
        GeoUnit::MilliDegree,
        GeoUnit::CentiDegree,
        GeoUnit::DeciDegree,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    #[default]
    Wgs84,
    Grs80,
}

impl Enumerated for CoordinateSystem {
    const VARIANTS: &'static [Self] = &[CoordinateSystem::Wgs84, CoordinateSystem::Grs80];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HemisphereLongitude {
    #[default]
    East,
    West,
}

impl Enumerated for HemisphereLongitude {
    const VARIANTS: &'static [Self] = &[HemisphereLongitude::East, HemisphereLongitude::West];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HemisphereLatitude {
    #[default]
    North,
    South,
}

impl Enumerated for HemisphereLatitude {
    const VARIANTS: &'static [Self] = &[HemisphereLatitude::North, HemisphereLatitude::South];
}

/// Day of year and second of day at which the content was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStamp {
    /// 1..=366
    pub day: i64,
    /// 0..=86399
    pub time: i64,
}

impl TimeStamp {
    fn encode(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_constrained_int(self.day, 1, 366, false).field("day")?;
        encoder.encode_constrained_int(self.time, 0, 86_399, false).field("time")
    }

    fn decode(decoder: &mut UperDecoder) -> UicResult<Self> {
        Ok(Self {
            day: decoder.decode_constrained_int(1, 366, false).field("day")?,
            time: decoder.decode_constrained_int(0, 86_399, false).field("time")?,
        })
    }
}

/// Geographic position
///
/// `None` in a defaulted field means the field was absent and its default
/// applies; the accessors resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeoCoordinate {
    pub geo_unit: Option<GeoUnit>,
    pub coordinate_system: Option<CoordinateSystem>,
    pub hemisphere_longitude: Option<HemisphereLongitude>,
    pub hemisphere_latitude: Option<HemisphereLatitude>,
    pub longitude: i64,
    pub latitude: i64,
    pub accuracy: Option<GeoUnit>,
}

impl GeoCoordinate {
    pub fn new(longitude: i64, latitude: i64) -> Self {
        Self {
            longitude,
            latitude,
            ..Self::default()
        }
    }

    pub fn unit(&self) -> GeoUnit {
        self.geo_unit.unwrap_or_default()
    }

    pub fn system(&self) -> CoordinateSystem {
        self.coordinate_system.unwrap_or_default()
    }

    pub fn longitude_hemisphere(&self) -> HemisphereLongitude {
        self.hemisphere_longitude.unwrap_or_default()
    }

    pub fn latitude_hemisphere(&self) -> HemisphereLatitude {
        self.hemisphere_latitude.unwrap_or_default()
    }

    fn encode(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_presence_bitmap(&[
            self.geo_unit.is_some(),
            self.coordinate_system.is_some(),
            self.hemisphere_longitude.is_some(),
            self.hemisphere_latitude.is_some(),
            self.accuracy.is_some(),
        ])?;
        if let Some(unit) = self.geo_unit {
            unit.encode(encoder).field("geoUnit")?;
        }
        if let Some(system) = self.coordinate_system {
            system.encode(encoder).field("coordinateSystem")?;
        }
        if let Some(hemisphere) = self.hemisphere_longitude {
            hemisphere.encode(encoder).field("hemisphereLongitude")?;
        }
        if let Some(hemisphere) = self.hemisphere_latitude {
            hemisphere.encode(encoder).field("hemisphereLatitude")?;
        }
        encoder.encode_unconstrained_integer(self.longitude).field("longitude")?;
        encoder.encode_unconstrained_integer(self.latitude).field("latitude")?;
        if let Some(accuracy) = self.accuracy {
            accuracy.encode(encoder).field("accuracy")?;
        }
        Ok(())
    }

    fn decode(decoder: &mut UperDecoder, config: &FrameConfig) -> UicResult<Self> {
        let extended = decoder.decode_sequence_extension_marker()?;
        let present = decoder.decode_presence_bitmap(5)?;
        let mut coordinate = GeoCoordinate::default();
        if present[0] {
            coordinate.geo_unit = Some(GeoUnit::decode(decoder).field("geoUnit")?);
        }
        if present[1] {
            coordinate.coordinate_system = Some(CoordinateSystem::decode(decoder).field("coordinateSystem")?);
        }
        if present[2] {
            coordinate.hemisphere_longitude =
                Some(HemisphereLongitude::decode(decoder).field("hemisphereLongitude")?);
        }
        if present[3] {
            coordinate.hemisphere_latitude =
                Some(HemisphereLatitude::decode(decoder).field("hemisphereLatitude")?);
        }
        coordinate.longitude = decoder.decode_unconstrained_integer().field("longitude")?;
        coordinate.latitude = decoder.decode_unconstrained_integer().field("latitude")?;
        if present[4] {
            coordinate.accuracy = Some(GeoUnit::decode(decoder).field("accuracy")?);
        }
        finish_extensions(decoder, extended, config, "GeoCoordinate")?;
        Ok(coordinate)
    }
}

/// Identified opaque extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionData {
    pub extension_id: String,
    pub extension_data: Vec<u8>,
}

impl ExtensionData {
    fn encode(&self, encoder: &mut UperEncoder) -> UicResult<()> {
        encoder.encode_ia5_string(&self.extension_id, None).field("extensionId")?;
        encoder.encode_octet_string(&self.extension_data, None).field("extensionData")
    }

    fn decode(decoder: &mut UperDecoder) -> UicResult<Self> {
        Ok(Self {
            extension_id: decoder.decode_ia5_string(None).field("extensionId")?,
            extension_data: decoder.decode_octet_string(None).field("extensionData")?,
        })
    }
}

/// `FDC1` dynamic content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DynamicContent {
    /// Identifier of the app that produced the content
    pub app_id: Option<String>,
    pub time_stamp: Option<TimeStamp>,
    pub geo_coordinate: Option<GeoCoordinate>,
    pub response_to_challenge: Option<Vec<ExtensionData>>,
    pub extension: Option<ExtensionData>,
}

impl DynamicContent {
    pub fn encode(&self) -> UicResult<Vec<u8>> {
        let mut encoder = UperEncoder::new();
        encoder.encode_sequence_extension_marker(false)?;
        encoder.encode_presence_bitmap(&[
            self.app_id.is_some(),
            self.time_stamp.is_some(),
            self.geo_coordinate.is_some(),
            self.response_to_challenge.is_some(),
            self.extension.is_some(),
        ])?;
        if let Some(app_id) = &self.app_id {
            encoder.encode_ia5_string(app_id, None).field("appId")?;
        }
        if let Some(time_stamp) = &self.time_stamp {
            time_stamp.encode(&mut encoder).field("timeStamp")?;
        }
        if let Some(coordinate) = &self.geo_coordinate {
            coordinate.encode(&mut encoder).field("geoCoordinate")?;
        }
        if let Some(responses) = &self.response_to_challenge {
            encoder
                .encode_sequence_of(responses, None, |encoder, item| item.encode(encoder))
                .field("responseToChallenge")?;
        }
        if let Some(extension) = &self.extension {
            extension.encode(&mut encoder).field("extension")?;
        }
        Ok(encoder.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> UicResult<Self> {
        Self::decode_with_config(bytes, &FrameConfig::default())
    }

    pub fn decode_with_config(bytes: &[u8], config: &FrameConfig) -> UicResult<Self> {
        let mut decoder = UperDecoder::new(bytes);
        let extended = decoder.decode_sequence_extension_marker()?;
        let present = decoder.decode_presence_bitmap(5)?;
        let mut content = DynamicContent::default();
        if present[0] {
            content.app_id = Some(decoder.decode_ia5_string(None).field("appId")?);
        }
        if present[1] {
            content.time_stamp = Some(TimeStamp::decode(&mut decoder).field("timeStamp")?);
        }
        if present[2] {
            content.geo_coordinate = Some(GeoCoordinate::decode(&mut decoder, config).field("geoCoordinate")?);
        }
        if present[3] {
            content.response_to_challenge = Some(
                decoder
                    .decode_sequence_of(None, ExtensionData::decode)
                    .field("responseToChallenge")?,
            );
        }
        if present[4] {
            content.extension = Some(ExtensionData::decode(&mut decoder).field("extension")?);
        }
        finish_extensions(&mut decoder, extended, config, "UicDynamicContentData")?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uic_core::UicError;

    fn sample() -> DynamicContent {
        DynamicContent {
            app_id: Some("APP1".to_string()),
            time_stamp: Some(TimeStamp { day: 75, time: 45_296 }),
            geo_coordinate: Some(GeoCoordinate {
                geo_unit: Some(GeoUnit::MicroDegree),
                hemisphere_latitude: Some(HemisphereLatitude::South),
                accuracy: Some(GeoUnit::CentiDegree),
                ..GeoCoordinate::new(8_541_694, -47_376_887)
            }),
            response_to_challenge: Some(vec![ExtensionData {
                extension_id: "CH1".to_string(),
                extension_data: vec![0xCA, 0xFE],
            }]),
            extension: None,
        }
    }

    #[test]
    fn test_content_roundtrip() {
        let content = sample();
        let bytes = content.encode().unwrap();
        let decoded = DynamicContent::decode(&bytes).unwrap();
        assert_eq!(decoded, content);
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_defaults_resolve() {
        let coordinate = GeoCoordinate::new(1, 2);
        assert_eq!(coordinate.unit(), GeoUnit::MilliDegree);
        assert_eq!(coordinate.system(), CoordinateSystem::Wgs84);
        assert_eq!(coordinate.longitude_hemisphere(), HemisphereLongitude::East);
        assert_eq!(coordinate.latitude_hemisphere(), HemisphereLatitude::North);
    }

    #[test]
    fn test_empty_content() {
        // extension bit + five absent fields
        assert_eq!(DynamicContent::default().encode().unwrap(), vec![0x00]);
        assert_eq!(DynamicContent::decode(&[0x00]).unwrap(), DynamicContent::default());
    }

    #[test]
    fn test_time_stamp_out_of_range() {
        let content = DynamicContent {
            time_stamp: Some(TimeStamp { day: 367, time: 0 }),
            ..DynamicContent::default()
        };
        let err = content.encode().unwrap_err();
        assert_eq!(err.field_path(), Some("timeStamp.day"));
        assert!(matches!(err.root_cause(), UicError::ValueOutOfRange { .. }));
    }
}
