//! Round-trip properties of the UPER primitives.
//!
//! Every value accepted by an encoder operation must decode back to itself
//! through the matching decoder operation, and consume exactly the bits that
//! were written.

use proptest::prelude::*;
use uic_asn1::{SizeConstraint, UperDecoder, UperEncoder};

fn encode<F>(write: F) -> (Vec<u8>, usize)
where
    F: FnOnce(&mut UperEncoder),
{
    let mut encoder = UperEncoder::new();
    write(&mut encoder);
    let bits = encoder.bit_len();
    (encoder.into_bytes(), bits)
}

fn constrained_case() -> impl Strategy<Value = (i64, i64, i64)> {
    (-100_000i64..100_000, 0i64..1_000_000).prop_flat_map(|(min, span)| {
        let max = min + span;
        (Just(min), Just(max), min..=max)
    })
}

proptest! {
    #[test]
    fn constrained_int_roundtrip((min, max, value) in constrained_case(), ext in any::<bool>()) {
        let (bytes, bits) = encode(|e| e.encode_constrained_int(value, min, max, ext).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_constrained_int(min, max, ext).unwrap(), value);
        prop_assert_eq!(decoder.position(), bits);
    }

    #[test]
    fn extension_escape_roundtrip(value in any::<i64>()) {
        let (bytes, _) = encode(|e| e.encode_constrained_int(value, 0, 15, true).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_constrained_int(0, 15, true).unwrap(), value);
    }

    #[test]
    fn unconstrained_int_roundtrip(value in any::<i64>()) {
        let (bytes, bits) = encode(|e| e.encode_unconstrained_integer(value).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_unconstrained_integer().unwrap(), value);
        prop_assert_eq!(decoder.position(), bits);
    }

    #[test]
    fn semi_constrained_int_roundtrip(min in -1_000_000i64..1_000_000, offset in 0i64..i64::MAX / 2) {
        let value = min + offset;
        let (bytes, _) = encode(|e| e.encode_semi_constrained_integer(value, min).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_semi_constrained_integer(min).unwrap(), value);
    }

    #[test]
    fn ia5_string_roundtrip(value in "[ -~]{0,200}") {
        let (bytes, bits) = encode(|e| e.encode_ia5_string(&value, None).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_ia5_string(None).unwrap(), value);
        prop_assert_eq!(decoder.position(), bits);
    }

    #[test]
    fn ia5_string_sized_roundtrip(value in "[A-Z0-9]{1,8}") {
        let size = Some(SizeConstraint::new(1, 8));
        let (bytes, bits) = encode(|e| e.encode_ia5_string(&value, size).unwrap());
        prop_assert_eq!(bits, 3 + value.len() * 7);
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_ia5_string(size).unwrap(), value);
    }

    #[test]
    fn utf8_string_roundtrip(value in "\\PC{0,60}") {
        let (bytes, _) = encode(|e| e.encode_utf8_string(&value).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_utf8_string().unwrap(), value);
    }

    #[test]
    fn octet_string_roundtrip(value in proptest::collection::vec(any::<u8>(), 0..400)) {
        let (bytes, _) = encode(|e| e.encode_octet_string(&value, None).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_octet_string(None).unwrap(), value);
    }

    #[test]
    fn fixed_octet_string_roundtrip(value in proptest::collection::vec(any::<u8>(), 16)) {
        let size = Some(SizeConstraint::fixed(16));
        let (bytes, bits) = encode(|e| e.encode_octet_string(&value, size).unwrap());
        prop_assert_eq!(bits, 128);
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_octet_string(size).unwrap(), value);
    }

    #[test]
    fn presence_bitmap_roundtrip(bits in proptest::collection::vec(any::<bool>(), 0..40), tail in any::<bool>()) {
        let (bytes, _) = encode(|e| {
            e.encode_presence_bitmap(&bits).unwrap();
            e.encode_boolean(tail).unwrap();
        });
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_presence_bitmap(bits.len()).unwrap(), bits);
        prop_assert_eq!(decoder.decode_boolean().unwrap(), tail);
    }

    #[test]
    fn bit_string_roundtrip(bits in proptest::collection::vec(any::<bool>(), 0..300)) {
        let (bytes, _) = encode(|e| e.encode_bit_string(&bits, None).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_bit_string(None).unwrap(), bits);
    }

    #[test]
    fn choice_index_roundtrip(root in 1usize..40, pick in 0usize..80, ext in any::<bool>()) {
        let index = if ext { pick } else { pick % root };
        let (bytes, _) = encode(|e| e.encode_choice_index(index, root, ext).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_choice_index(root, ext).unwrap(), index);
    }

    #[test]
    fn enumerated_roundtrip(root in 1usize..20, pick in 0usize..200, ext in any::<bool>()) {
        let index = if ext { pick } else { pick % root };
        let (bytes, _) = encode(|e| e.encode_enumerated(index, root, ext).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_enumerated(root, ext).unwrap(), index);
    }

    #[test]
    fn length_determinant_roundtrip(length in 0usize..=16383) {
        let (bytes, bits) = encode(|e| e.encode_length_determinant(length).unwrap());
        prop_assert_eq!(bits, if length < 128 { 8 } else { 16 });
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_length_determinant().unwrap(), length);
    }

    #[test]
    fn sequence_of_int_roundtrip(values in proptest::collection::vec(0i64..=99_999, 0..12)) {
        let size = Some(SizeConstraint::new(0, 12));
        let (bytes, _) = encode(|e| e.encode_sequence_of_int(&values, size, 0, 99_999).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_sequence_of_int(size, 0, 99_999).unwrap(), values);
    }

    #[test]
    fn object_identifier_roundtrip(arcs in proptest::collection::vec(0u64..1_000_000, 0..6), second in 0u64..40) {
        let mut oid = format!("1.{}", second);
        for arc in &arcs {
            oid.push_str(&format!(".{}", arc));
        }
        let (bytes, _) = encode(|e| e.encode_object_identifier(&oid).unwrap());
        let mut decoder = UperDecoder::new(&bytes);
        prop_assert_eq!(decoder.decode_object_identifier().unwrap(), oid);
    }
}

#[test]
fn constrained_int_boundaries() {
    for (min, max) in [(0, 1), (1, 366), (2016, 2269), (-5, 5), (0, 99_999), (1, 32_000)] {
        for value in [min, max] {
            let (bytes, _) = encode(|e| e.encode_constrained_int(value, min, max, false).unwrap());
            let mut decoder = UperDecoder::new(&bytes);
            assert_eq!(decoder.decode_constrained_int(min, max, false).unwrap(), value);
        }
    }
}

#[test]
fn empty_strings_roundtrip() {
    let (bytes, _) = encode(|e| {
        e.encode_ia5_string("", None).unwrap();
        e.encode_utf8_string("").unwrap();
        e.encode_octet_string(&[], None).unwrap();
    });
    assert_eq!(bytes, vec![0x00, 0x00, 0x00]);

    let mut decoder = UperDecoder::new(&bytes);
    assert_eq!(decoder.decode_ia5_string(None).unwrap(), "");
    assert_eq!(decoder.decode_utf8_string().unwrap(), "");
    assert!(decoder.decode_octet_string(None).unwrap().is_empty());
}

#[test]
fn mixed_structure_is_bit_exact() {
    let (bytes, _) = encode(|e| {
        e.encode_sequence_extension_marker(false).unwrap();
        e.encode_presence_bitmap(&[true, false, true]).unwrap();
        e.encode_constrained_int(1080, 1, 32_000, false).unwrap();
        e.encode_ia5_string("FCB3", None).unwrap();
        e.encode_octet_string(&[0xDE, 0xAD], None).unwrap();
    });

    let mut decoder = UperDecoder::new(&bytes);
    assert!(!decoder.decode_sequence_extension_marker().unwrap());
    assert_eq!(decoder.decode_presence_bitmap(3).unwrap(), vec![true, false, true]);
    assert_eq!(decoder.decode_constrained_int(1, 32_000, false).unwrap(), 1080);
    assert_eq!(decoder.decode_ia5_string(None).unwrap(), "FCB3");
    assert_eq!(decoder.decode_octet_string(None).unwrap(), vec![0xDE, 0xAD]);

    let mut encoder = UperEncoder::new();
    encoder.encode_sequence_extension_marker(false).unwrap();
    encoder.encode_presence_bitmap(&[true, false, true]).unwrap();
    encoder.encode_constrained_int(1080, 1, 32_000, false).unwrap();
    encoder.encode_ia5_string("FCB3", None).unwrap();
    encoder.encode_octet_string(&[0xDE, 0xAD], None).unwrap();
    assert_eq!(encoder.into_bytes(), bytes);
}
