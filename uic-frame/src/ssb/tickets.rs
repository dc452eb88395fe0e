//! SSB ticket bodies
//!
//! The body occupies the 437 bits between the header and the signature.
//! Ticket types 1 to 4 start with the same [`SsbCommon`] part. Bits a body
//! layout does not use are zero on the wire and are not kept on decode.
//!
//! Text fields hold a fixed number of 6-bit characters. Shorter text is
//! padded with spaces on encode and trailing spaces are dropped on decode,
//! so text that ends in spaces does not round-trip.

use super::charset::{read_chars, write_chars, write_uint};
use uic_core::{BitBuffer, ResultExt, UicError, UicResult};

/// Body length in bits
pub const BODY_BITS: usize = 437;

/// Bytes needed to hold a raw body
pub const BODY_BYTES: usize = 55;

const STATIONS_BITS: usize = 73;

/// Fields shared by ticket types 1 to 4 (118 bits)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SsbCommon {
    /// 7 bits
    pub adults: u8,
    /// 7 bits
    pub children: u8,
    pub specimen: bool,
    /// Class of travel, 6 bits
    pub class_code: u8,
    /// 14 characters, padded with spaces
    pub ticket_number: String,
    /// Last digit of the issuing year, 4 bits
    pub year: u8,
    /// Issuing day of the year, 9 bits
    pub day: u16,
}

impl SsbCommon {
    fn decode(reader: &mut BitBuffer) -> UicResult<Self> {
        Ok(Self {
            adults: reader.get_bits(7)? as u8,
            children: reader.get_bits(7)? as u8,
            specimen: reader.get_bit()?,
            class_code: reader.get_bits(6)? as u8,
            ticket_number: read_chars(reader, 14, "ticketNumber")?,
            year: reader.get_bits(4)? as u8,
            day: reader.get_bits(9)? as u16,
        })
    }

    fn encode(&self, writer: &mut BitBuffer) -> UicResult<()> {
        write_uint(writer, u64::from(self.adults), 7, "adults")?;
        write_uint(writer, u64::from(self.children), 7, "children")?;
        writer.put_bit(self.specimen)?;
        write_uint(writer, u64::from(self.class_code), 6, "classCode")?;
        write_chars(writer, &self.ticket_number, 14, "ticketNumber")?;
        write_uint(writer, u64::from(self.year), 4, "year")?;
        write_uint(writer, u64::from(self.day), 9, "day")
    }
}

/// Departure and arrival stations (73 bits)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsbStations {
    /// Station names, 6 characters each, padded with spaces
    Alphanumeric { departure: String, arrival: String },
    /// Station codes from a code table (4 bits), 28 bits each
    Coded {
        code_table: u8,
        departure: u32,
        arrival: u32,
    },
}

impl SsbStations {
    fn decode(reader: &mut BitBuffer) -> UicResult<Self> {
        let start = reader.position();
        let stations = if reader.get_bit()? {
            SsbStations::Alphanumeric {
                departure: read_chars(reader, 6, "departure")?,
                arrival: read_chars(reader, 6, "arrival")?,
            }
        } else {
            SsbStations::Coded {
                code_table: reader.get_bits(4)? as u8,
                departure: reader.get_bits(28)? as u32,
                arrival: reader.get_bits(28)? as u32,
            }
        };
        reader.seek(start + STATIONS_BITS)?;
        Ok(stations)
    }

    fn encode(&self, writer: &mut BitBuffer) -> UicResult<()> {
        let start = writer.position();
        match self {
            SsbStations::Alphanumeric { departure, arrival } => {
                writer.put_bit(true)?;
                write_chars(writer, departure, 6, "departure")?;
                write_chars(writer, arrival, 6, "arrival")?;
            }
            SsbStations::Coded {
                code_table,
                departure,
                arrival,
            } => {
                writer.put_bit(false)?;
                write_uint(writer, u64::from(*code_table), 4, "codeTable")?;
                write_uint(writer, u64::from(*departure), 28, "departure")?;
                write_uint(writer, u64::from(*arrival), 28, "arrival")?;
            }
        }
        writer.put_bits(0, start + STATIONS_BITS - writer.position())
    }
}

/// Integrated reservation ticket (type 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsbReservation {
    pub common: SsbCommon,
    /// IRT, RES or BOA, 2 bits
    pub sub_type: u8,
    pub stations: SsbStations,
    /// Day of the year, 9 bits
    pub departure_date: u16,
    /// Minutes after midnight, 11 bits
    pub departure_time: u16,
    /// 5 characters, padded with spaces
    pub train: String,
    /// 10 bits
    pub coach: u16,
    /// 3 characters, padded with spaces
    pub seat: String,
    pub overbooking: bool,
    /// 14 bits
    pub info_code: u16,
    /// 24 characters, padded with spaces
    pub text: String,
}

/// Non-reservation ticket (type 2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsbNonReservation {
    pub common: SsbCommon,
    pub return_journey: bool,
    /// 9 bits
    pub first_day: u16,
    /// 9 bits
    pub last_day: u16,
    pub stations: SsbStations,
    pub info_code: u16,
    /// 35 characters, padded with spaces
    pub text: String,
}

/// Group ticket (type 3)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsbGroup {
    pub common: SsbCommon,
    pub return_journey: bool,
    pub first_day: u16,
    pub last_day: u16,
    pub stations: SsbStations,
    /// 12 characters, padded with spaces
    pub group_name: String,
    /// 9 bits
    pub counter_mark: u16,
    pub info_code: u16,
    /// 22 characters, padded with spaces
    pub text: String,
}

/// Rail pass (type 4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsbPass {
    pub common: SsbCommon,
    /// 2 bits
    pub sub_type: u8,
    pub first_day: u16,
    /// Maximum validity duration in days, 9 bits
    pub max_duration: u16,
    /// 7 bits
    pub travel_days: u8,
    /// UIC country codes, 7 bits each
    pub countries: [u8; 5],
    pub second_page: bool,
    pub info_code: u16,
    /// 40 characters, padded with spaces
    pub text: String,
}

/// SSB ticket body, selected by the 5-bit ticket type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsbTicket {
    /// Type 0: open data, 437 bits kept as [`BODY_BYTES`] bytes
    NonUic(Vec<u8>),
    Reservation(SsbReservation),
    NonReservation(SsbNonReservation),
    Group(SsbGroup),
    Pass(SsbPass),
    /// Types 5 to 31, kept as raw bits
    Unknown { ticket_type: u8, data: Vec<u8> },
}

fn read_raw(reader: &mut BitBuffer) -> UicResult<Vec<u8>> {
    let mut raw = BitBuffer::with_capacity_bits(BODY_BITS);
    let mut left = BODY_BITS;
    while left > 0 {
        let count = left.min(64);
        raw.put_bits(reader.get_bits(count)?, count)?;
        left -= count;
    }
    Ok(raw.into_bytes())
}

fn write_raw(writer: &mut BitBuffer, data: &[u8]) -> UicResult<()> {
    if data.len() > BODY_BYTES {
        return Err(UicError::InvalidLength {
            expected: BODY_BYTES,
            actual: data.len(),
        });
    }
    let mut padded = data.to_vec();
    padded.resize(BODY_BYTES, 0);
    let mut raw = BitBuffer::from_bytes(&padded);
    let mut left = BODY_BITS;
    while left > 0 {
        let count = left.min(64);
        writer.put_bits(raw.get_bits(count)?, count)?;
        left -= count;
    }
    Ok(())
}

impl SsbTicket {
    /// 5-bit ticket type code
    pub fn ticket_type(&self) -> u8 {
        match self {
            SsbTicket::NonUic(_) => 0,
            SsbTicket::Reservation(_) => 1,
            SsbTicket::NonReservation(_) => 2,
            SsbTicket::Group(_) => 3,
            SsbTicket::Pass(_) => 4,
            SsbTicket::Unknown { ticket_type, .. } => *ticket_type,
        }
    }

    pub fn common(&self) -> Option<&SsbCommon> {
        match self {
            SsbTicket::Reservation(ticket) => Some(&ticket.common),
            SsbTicket::NonReservation(ticket) => Some(&ticket.common),
            SsbTicket::Group(ticket) => Some(&ticket.common),
            SsbTicket::Pass(ticket) => Some(&ticket.common),
            SsbTicket::NonUic(_) | SsbTicket::Unknown { .. } => None,
        }
    }

    pub(crate) fn decode(ticket_type: u8, reader: &mut BitBuffer) -> UicResult<Self> {
        let ticket = match ticket_type {
            0 => SsbTicket::NonUic(read_raw(reader)?),
            1 => {
                let common = SsbCommon::decode(reader)?;
                SsbTicket::Reservation(SsbReservation {
                    common,
                    sub_type: reader.get_bits(2)? as u8,
                    stations: SsbStations::decode(reader).field("stations")?,
                    departure_date: reader.get_bits(9)? as u16,
                    departure_time: reader.get_bits(11)? as u16,
                    train: read_chars(reader, 5, "train")?,
                    coach: reader.get_bits(10)? as u16,
                    seat: read_chars(reader, 3, "seat")?,
                    overbooking: reader.get_bit()?,
                    info_code: reader.get_bits(14)? as u16,
                    text: read_chars(reader, 24, "text")?,
                })
            }
            2 => {
                let common = SsbCommon::decode(reader)?;
                SsbTicket::NonReservation(SsbNonReservation {
                    common,
                    return_journey: reader.get_bit()?,
                    first_day: reader.get_bits(9)? as u16,
                    last_day: reader.get_bits(9)? as u16,
                    stations: SsbStations::decode(reader).field("stations")?,
                    info_code: reader.get_bits(14)? as u16,
                    text: read_chars(reader, 35, "text")?,
                })
            }
            3 => {
                let common = SsbCommon::decode(reader)?;
                SsbTicket::Group(SsbGroup {
                    common,
                    return_journey: reader.get_bit()?,
                    first_day: reader.get_bits(9)? as u16,
                    last_day: reader.get_bits(9)? as u16,
                    stations: SsbStations::decode(reader).field("stations")?,
                    group_name: read_chars(reader, 12, "groupName")?,
                    counter_mark: reader.get_bits(9)? as u16,
                    info_code: reader.get_bits(14)? as u16,
                    text: read_chars(reader, 22, "text")?,
                })
            }
            4 => {
                let common = SsbCommon::decode(reader)?;
                let sub_type = reader.get_bits(2)? as u8;
                let first_day = reader.get_bits(9)? as u16;
                let max_duration = reader.get_bits(9)? as u16;
                let travel_days = reader.get_bits(7)? as u8;
                let mut countries = [0u8; 5];
                for country in countries.iter_mut() {
                    *country = reader.get_bits(7)? as u8;
                }
                SsbTicket::Pass(SsbPass {
                    common,
                    sub_type,
                    first_day,
                    max_duration,
                    travel_days,
                    countries,
                    second_page: reader.get_bit()?,
                    info_code: reader.get_bits(14)? as u16,
                    text: read_chars(reader, 40, "text")?,
                })
            }
            other => SsbTicket::Unknown {
                ticket_type: other,
                data: read_raw(reader)?,
            },
        };
        Ok(ticket)
    }

    pub(crate) fn encode(&self, writer: &mut BitBuffer) -> UicResult<()> {
        let start = writer.position();
        match self {
            SsbTicket::Unknown { ticket_type, .. } if *ticket_type < 5 => {
                return Err(UicError::Structural(format!(
                    "Ticket type {} has a defined layout",
                    ticket_type
                )));
            }
            SsbTicket::NonUic(data) | SsbTicket::Unknown { data, .. } => {
                write_raw(writer, data).field("data")?;
            }
            SsbTicket::Reservation(ticket) => {
                ticket.common.encode(writer)?;
                write_uint(writer, u64::from(ticket.sub_type), 2, "subType")?;
                ticket.stations.encode(writer).field("stations")?;
                write_uint(writer, u64::from(ticket.departure_date), 9, "departureDate")?;
                write_uint(writer, u64::from(ticket.departure_time), 11, "departureTime")?;
                write_chars(writer, &ticket.train, 5, "train")?;
                write_uint(writer, u64::from(ticket.coach), 10, "coach")?;
                write_chars(writer, &ticket.seat, 3, "seat")?;
                writer.put_bit(ticket.overbooking)?;
                write_uint(writer, u64::from(ticket.info_code), 14, "infoCode")?;
                write_chars(writer, &ticket.text, 24, "text")?;
            }
            SsbTicket::NonReservation(ticket) => {
                ticket.common.encode(writer)?;
                writer.put_bit(ticket.return_journey)?;
                write_uint(writer, u64::from(ticket.first_day), 9, "firstDay")?;
                write_uint(writer, u64::from(ticket.last_day), 9, "lastDay")?;
                ticket.stations.encode(writer).field("stations")?;
                write_uint(writer, u64::from(ticket.info_code), 14, "infoCode")?;
                write_chars(writer, &ticket.text, 35, "text")?;
            }
            SsbTicket::Group(ticket) => {
                ticket.common.encode(writer)?;
                writer.put_bit(ticket.return_journey)?;
                write_uint(writer, u64::from(ticket.first_day), 9, "firstDay")?;
                write_uint(writer, u64::from(ticket.last_day), 9, "lastDay")?;
                ticket.stations.encode(writer).field("stations")?;
                write_chars(writer, &ticket.group_name, 12, "groupName")?;
                write_uint(writer, u64::from(ticket.counter_mark), 9, "counterMark")?;
                write_uint(writer, u64::from(ticket.info_code), 14, "infoCode")?;
                write_chars(writer, &ticket.text, 22, "text")?;
            }
            SsbTicket::Pass(ticket) => {
                ticket.common.encode(writer)?;
                write_uint(writer, u64::from(ticket.sub_type), 2, "subType")?;
                write_uint(writer, u64::from(ticket.first_day), 9, "firstDay")?;
                write_uint(writer, u64::from(ticket.max_duration), 9, "maxDuration")?;
                write_uint(writer, u64::from(ticket.travel_days), 7, "travelDays")?;
                for (index, country) in ticket.countries.iter().enumerate() {
                    write_uint(writer, u64::from(*country), 7, &format!("countries[{}]", index))?;
                }
                writer.put_bit(ticket.second_page)?;
                write_uint(writer, u64::from(ticket.info_code), 14, "infoCode")?;
                write_chars(writer, &ticket.text, 40, "text")?;
            }
        }
        let used = writer.position() - start;
        log::trace!("SSB ticket type {} uses {} of {} body bits", self.ticket_type(), used, BODY_BITS);
        writer.put_bits(0, BODY_BITS - used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common() -> SsbCommon {
        SsbCommon {
            adults: 2,
            children: 1,
            specimen: false,
            class_code: 2,
            ticket_number: "ABC123".to_string(),
            year: 4,
            day: 120,
        }
    }

    fn roundtrip(ticket: &SsbTicket) -> (SsbTicket, usize) {
        let mut writer = BitBuffer::with_capacity_bits(BODY_BITS);
        ticket.encode(&mut writer).unwrap();
        let bits = writer.position();
        let bytes = writer.into_bytes();
        let mut reader = BitBuffer::from_bytes(&bytes);
        (SsbTicket::decode(ticket.ticket_type(), &mut reader).unwrap(), bits)
    }

    #[test]
    fn test_reservation_roundtrip() {
        let ticket = SsbTicket::Reservation(SsbReservation {
            common: common(),
            sub_type: 1,
            stations: SsbStations::Alphanumeric {
                departure: "FRPNO".to_string(),
                arrival: "FRLYS".to_string(),
            },
            departure_date: 121,
            departure_time: 8 * 60 + 15,
            train: "6601".to_string(),
            coach: 12,
            seat: "45".to_string(),
            overbooking: false,
            info_code: 0,
            text: "WINDOW".to_string(),
        });
        let (decoded, bits) = roundtrip(&ticket);
        assert_eq!(bits, BODY_BITS);
        assert_eq!(decoded, ticket);
    }

    #[test]
    fn test_pass_and_group_roundtrip() {
        let pass = SsbTicket::Pass(SsbPass {
            common: common(),
            sub_type: 0,
            first_day: 10,
            max_duration: 30,
            travel_days: 7,
            countries: [80, 81, 85, 0, 0],
            second_page: false,
            info_code: 1,
            text: "INTERRAIL".to_string(),
        });
        assert_eq!(roundtrip(&pass).0, pass);

        let group = SsbTicket::Group(SsbGroup {
            common: common(),
            return_journey: true,
            first_day: 1,
            last_day: 2,
            stations: SsbStations::Coded {
                code_table: 1,
                departure: 8_000_105,
                arrival: 8_000_261,
            },
            group_name: "SCHOOL TRIP".to_string(),
            counter_mark: 3,
            info_code: 0,
            text: String::new(),
        });
        assert_eq!(roundtrip(&group).0, group);
    }

    #[test]
    fn test_raw_bodies() {
        let mut data = vec![0xFF; BODY_BYTES];
        data[BODY_BYTES - 1] = 0xF8;
        let non_uic = SsbTicket::NonUic(data);
        assert_eq!(roundtrip(&non_uic).0, non_uic);

        let unknown = SsbTicket::Unknown {
            ticket_type: 17,
            data: vec![0xAB; BODY_BYTES],
        };
        match roundtrip(&unknown).0 {
            SsbTicket::Unknown { ticket_type, data } => {
                assert_eq!(ticket_type, 17);
                // bits past the body are not kept
                assert_eq!(data[BODY_BYTES - 1], 0xA8);
            }
            other => panic!("unexpected ticket {:?}", other),
        }
    }

    #[test]
    fn test_field_errors() {
        let mut ticket = SsbNonReservation {
            common: common(),
            return_journey: false,
            first_day: 1,
            last_day: 600,
            stations: SsbStations::Coded {
                code_table: 0,
                departure: 1,
                arrival: 2,
            },
            info_code: 0,
            text: String::new(),
        };
        let mut writer = BitBuffer::with_capacity_bits(BODY_BITS);
        let err = SsbTicket::NonReservation(ticket.clone()).encode(&mut writer).unwrap_err();
        assert_eq!(err.field_path(), Some("lastDay"));

        ticket.last_day = 2;
        ticket.stations = SsbStations::Alphanumeric {
            departure: "zurich".to_string(),
            arrival: "BERN".to_string(),
        };
        let mut writer = BitBuffer::with_capacity_bits(BODY_BITS);
        let err = SsbTicket::NonReservation(ticket).encode(&mut writer).unwrap_err();
        assert_eq!(err.field_path(), Some("stations.departure"));
        assert!(matches!(err.root_cause(), UicError::InvalidString(_)));
    }
}
