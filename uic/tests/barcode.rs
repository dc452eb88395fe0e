//! End-to-end barcode creation, detection and verification

use uic::frame::dynamic_frame::{DynamicContent, GeoCoordinate, TimeStamp};
use uic::frame::ssb::{SsbCommon, SsbHeader, SsbPass, SsbTicket};
use uic::frame::static_frame::{LayoutField, TicketLayoutRecord};
use uic::frame::SsbFrame;
use uic::security::{RingSigner, RingVerifier, SignatureAlgorithm, Signer};
use uic::{
    decode_barcode, detect, Barcode, BarcodeBuilder, BarcodeKind, DynamicFormat, FcbVersion,
    SignatureValidation, StaticVersion, TicketCodec, TicketPayload, UicError, UicResult,
};

fn ticket() -> TicketPayload {
    TicketPayload::new(FcbVersion::V3, vec![0x04, 0x40, 0x00, 0x2B, 0x91])
}

#[test]
fn static_barcode_end_to_end() {
    let (signer, _) = RingSigner::generate(SignatureAlgorithm::EcdsaP256Sha256).unwrap();
    let mut frame = BarcodeBuilder::new()
        .security_provider(1184)
        .key_id(3)
        .static_version(StaticVersion::V2)
        .layout_record(TicketLayoutRecord {
            version: 1,
            standard: "RCT2".to_string(),
            fields: vec![LayoutField {
                line: 1,
                column: 2,
                height: 1,
                width: 20,
                format: 0,
                text: "Amsterdam C".to_string(),
            }],
        })
        .ticket(ticket())
        .build_static()
        .unwrap();
    frame.sign(&signer).unwrap();
    let bytes = frame.encode().unwrap();
    assert_eq!(detect(&bytes), BarcodeKind::Static);

    let barcode = decode_barcode(&bytes).unwrap();
    assert_eq!(barcode.kind(), BarcodeKind::Static);
    assert_eq!(barcode.ticket_payloads().unwrap(), vec![ticket()]);
    assert_eq!(barcode.encode().unwrap(), bytes);
    assert_eq!(
        barcode.verify(&RingVerifier::new(), &signer.public_key(), &signer.algorithm_oid()),
        SignatureValidation::Valid
    );
    match barcode {
        Barcode::Static(frame) => {
            assert_eq!(frame.layout_record().unwrap().fields[0].text, "Amsterdam C");
        }
        other => panic!("unexpected barcode {:?}", other),
    }
}

#[test]
fn dynamic_barcode_end_to_end() {
    let (issuer, _) = RingSigner::generate(SignatureAlgorithm::EcdsaP256Sha256).unwrap();
    let (device, _) = RingSigner::generate(SignatureAlgorithm::EcdsaP384Sha384).unwrap();

    let mut frame = BarcodeBuilder::new()
        .security_provider(1080)
        .key_id(12)
        .dynamic_format(DynamicFormat::U2)
        .ticket(ticket())
        .level2_key(device.public_key(), &device.algorithm_oid())
        .end_of_validity(2025, 40, 720)
        .dynamic_content(DynamicContent {
            app_id: Some("RAILAPP".to_string()),
            time_stamp: Some(TimeStamp { day: 40, time: 43_200 }),
            geo_coordinate: Some(GeoCoordinate::new(8_540_000, 47_378_000)),
            ..DynamicContent::default()
        })
        .build_dynamic()
        .unwrap();
    frame.sign_level1(&issuer).unwrap();
    frame.sign_level2(&device).unwrap();
    let bytes = frame.encode().unwrap();
    assert_eq!(detect(&bytes), BarcodeKind::Dynamic);

    let barcode = decode_barcode(&bytes).unwrap();
    assert_eq!(barcode.ticket_payloads().unwrap(), vec![ticket()]);
    assert_eq!(
        barcode.verify(&RingVerifier::new(), &issuer.public_key(), ""),
        SignatureValidation::Valid
    );
    let Barcode::Dynamic(decoded) = barcode else {
        panic!("expected a dynamic frame");
    };
    assert_eq!(decoded.validate_level2(&RingVerifier::new()), SignatureValidation::Valid);
    let content = decoded.dynamic_content().unwrap().unwrap();
    assert_eq!(content.geo_coordinate.unwrap().latitude, 47_378_000);
    assert_eq!(decoded.level1_data().end_of_validity_time, Some(720));
}

#[test]
fn ssb_barcode_is_detected_by_length() {
    let frame = SsbFrame::new(
        SsbHeader::new(3, 1080, 2),
        SsbTicket::Pass(SsbPass {
            common: SsbCommon {
                adults: 1,
                class_code: 2,
                ticket_number: "IR2024X".to_string(),
                year: 4,
                day: 150,
                ..SsbCommon::default()
            },
            sub_type: 1,
            first_day: 152,
            max_duration: 30,
            travel_days: 10,
            countries: [80, 85, 87, 0, 0],
            second_page: false,
            info_code: 0,
            text: "GLOBAL PASS".to_string(),
        }),
    );
    let bytes = frame.encode().unwrap();
    assert_eq!(bytes.len(), 114);
    assert_eq!(detect(&bytes), BarcodeKind::Ssb);

    let barcode = decode_barcode(&bytes).unwrap();
    assert_eq!(barcode, Barcode::Ssb(frame));
    assert!(barcode.ticket_payloads().unwrap().is_empty());
    assert_eq!(
        barcode.verify(&RingVerifier::new(), &[0x04; 57], SignatureAlgorithm::DsaSha224.oid()),
        SignatureValidation::SignatureMissing
    );
}

/// Ticket model holding only a booking reference
#[derive(Debug, Clone, PartialEq, Eq)]
struct Booking {
    reference: String,
}

struct BookingCodec;

impl TicketCodec for BookingCodec {
    type Ticket = Booking;

    fn decode(&self, payload: &TicketPayload) -> UicResult<Booking> {
        let reference = String::from_utf8(payload.bytes.clone())
            .map_err(|err| UicError::InvalidString(err.to_string()))?;
        Ok(Booking { reference })
    }

    fn encode(&self, ticket: &Booking) -> UicResult<TicketPayload> {
        Ok(TicketPayload::new(FcbVersion::V3, ticket.reference.as_bytes().to_vec()))
    }
}

#[test]
fn typed_tickets_through_codec() {
    let booking = Booking {
        reference: "PNR4KQ2Z".to_string(),
    };
    let frame = BarcodeBuilder::new()
        .security_provider(1080)
        .key_id(3)
        .encoded_ticket(&BookingCodec, &booking)
        .unwrap()
        .build_dynamic()
        .unwrap();
    let barcode = decode_barcode(&frame.encode().unwrap()).unwrap();
    assert_eq!(barcode.tickets(&BookingCodec).unwrap(), vec![booking.clone()]);
    assert_eq!(barcode.ticket_payloads().unwrap()[0].bytes, b"PNR4KQ2Z".to_vec());

    let frame = BarcodeBuilder::new()
        .security_provider(1080)
        .key_id(3)
        .encoded_ticket(&BookingCodec, &booking)
        .unwrap()
        .build_static()
        .unwrap();
    let barcode = decode_barcode(&frame.encode().unwrap()).unwrap();
    assert_eq!(barcode.tickets(&BookingCodec).unwrap(), vec![booking]);
}

#[test]
fn garbage_is_rejected() {
    assert!(decode_barcode(&[0xFF; 20]).is_err());
    assert!(decode_barcode(b"#UT99").is_err());
}
