//! Minimal DER reader/writer for signatures and public keys
//!
//! Barcode frames store signatures in two shapes: DER `SEQUENCE { r, s }`
//! (what crypto backends produce and consume) and raw fixed-width `r ‖ s`
//! (Static Frame v2 and SSB). This module converts between them and extracts
//! the key bits from an X.509 `SubjectPublicKeyInfo`.
//!
//! # Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
//!
//! Indefinite lengths are not valid DER and are rejected.

use uic_core::{UicError, UicResult};

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_SEQUENCE: u8 = 0x30;

fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length < 128 {
        out.push(length as u8);
        return;
    }
    let bytes: Vec<u8> = length
        .to_be_bytes()
        .into_iter()
        .skip_while(|&b| b == 0)
        .collect();
    out.push(0x80 | bytes.len() as u8);
    out.extend_from_slice(&bytes);
}

/// Decode a DER length; returns `(length, bytes consumed)`
fn decode_length(data: &[u8]) -> UicResult<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| UicError::Structural("Not enough bytes for DER length".to_string()))?;
    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let count = (first & 0x7F) as usize;
    if count == 0 {
        return Err(UicError::Structural(
            "Indefinite length encoding not supported".to_string(),
        ));
    }
    if count > 4 {
        return Err(UicError::Structural(format!(
            "Length encoding too large: {} bytes (max 4)",
            count
        )));
    }
    if data.len() < 1 + count {
        return Err(UicError::Structural(format!(
            "Buffer too short for long form length: need {} bytes, got {}",
            1 + count,
            data.len()
        )));
    }
    let length = data[1..=count]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((length, 1 + count))
}

/// Split one TLV off the front of `data`: `(tag, value, rest)`
fn read_tlv(data: &[u8]) -> UicResult<(u8, &[u8], &[u8])> {
    let tag = *data
        .first()
        .ok_or_else(|| UicError::Structural("Unexpected end of DER data".to_string()))?;
    let (length, consumed) = decode_length(&data[1..])?;
    let start = 1 + consumed;
    let end = start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            UicError::Structural(format!(
                "DER value of {} bytes overruns buffer of {}",
                length,
                data.len()
            ))
        })?;
    Ok((tag, &data[start..end], &data[end..]))
}

fn expect_tlv<'a>(data: &'a [u8], expected: u8, what: &str) -> UicResult<(&'a [u8], &'a [u8])> {
    let (tag, value, rest) = read_tlv(data)?;
    if tag != expected {
        return Err(UicError::Structural(format!(
            "Expected {} tag 0x{:02X}, got 0x{:02X}",
            what, expected, tag
        )));
    }
    Ok((value, rest))
}

fn push_integer(out: &mut Vec<u8>, magnitude: &[u8]) {
    let trimmed: Vec<u8> = magnitude.iter().copied().skip_while(|&b| b == 0).collect();
    let mut content = if trimmed.is_empty() { vec![0] } else { trimmed };
    if content[0] & 0x80 != 0 {
        content.insert(0, 0);
    }
    out.push(TAG_INTEGER);
    encode_length(content.len(), out);
    out.extend_from_slice(&content);
}

/// Total length of the DER element at the start of `data`
///
/// Used to strip the zero padding after a signature stored in a fixed slot.
pub fn element_length(data: &[u8]) -> UicResult<usize> {
    let (_, value, _) = read_tlv(data)?;
    let (_, consumed) = decode_length(&data[1..])?;
    Ok(1 + consumed + value.len())
}

/// Build a DER `SEQUENCE { INTEGER r, INTEGER s }` from unsigned big-endian halves
pub fn signature_from_components(r: &[u8], s: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(r.len() + s.len() + 6);
    push_integer(&mut body, r);
    push_integer(&mut body, s);

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(TAG_SEQUENCE);
    encode_length(body.len(), &mut out);
    out.extend_from_slice(&body);
    out
}

/// Build a DER signature from a raw `r ‖ s` block of two equal halves
pub fn signature_from_raw(raw: &[u8]) -> UicResult<Vec<u8>> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return Err(UicError::InvalidSignature(format!(
            "Raw signature length {} is not two equal halves",
            raw.len()
        )));
    }
    let (r, s) = raw.split_at(raw.len() / 2);
    Ok(signature_from_components(r, s))
}

/// Split a DER signature into unsigned big-endian `(r, s)`
pub fn signature_components(der: &[u8]) -> UicResult<(Vec<u8>, Vec<u8>)> {
    let (body, _) = expect_tlv(der, TAG_SEQUENCE, "SEQUENCE")?;
    let (r, rest) = expect_tlv(body, TAG_INTEGER, "INTEGER")?;
    let (s, rest) = expect_tlv(rest, TAG_INTEGER, "INTEGER")?;
    if !rest.is_empty() {
        return Err(UicError::InvalidSignature(
            "Trailing data after signature components".to_string(),
        ));
    }
    let strip = |v: &[u8]| -> Vec<u8> { v.iter().copied().skip_while(|&b| b == 0).collect() };
    Ok((strip(r), strip(s)))
}

/// Convert a DER signature into raw `r ‖ s`, each half left-padded to `component_len`
pub fn signature_to_raw(der: &[u8], component_len: usize) -> UicResult<Vec<u8>> {
    let (r, s) = signature_components(der)?;
    let mut raw = vec![0u8; component_len * 2];
    for (index, part) in [r, s].iter().enumerate() {
        if part.len() > component_len {
            return Err(UicError::InvalidSignature(format!(
                "Signature component of {} bytes exceeds {}",
                part.len(),
                component_len
            )));
        }
        let end = (index + 1) * component_len;
        raw[end - part.len()..end].copy_from_slice(part);
    }
    Ok(raw)
}

/// Key bits of an X.509 `SubjectPublicKeyInfo`
///
/// ```text
/// SEQUENCE { SEQUENCE { algorithm, parameters }, BIT STRING subjectPublicKey }
/// ```
pub fn subject_public_key(spki: &[u8]) -> UicResult<Vec<u8>> {
    let (body, _) = expect_tlv(spki, TAG_SEQUENCE, "SEQUENCE")
        .map_err(|e| UicError::MalformedKey(e.to_string()))?;
    let (_, rest) = expect_tlv(body, TAG_SEQUENCE, "AlgorithmIdentifier")
        .map_err(|e| UicError::MalformedKey(e.to_string()))?;
    let (bits, _) = expect_tlv(rest, TAG_BIT_STRING, "BIT STRING")
        .map_err(|e| UicError::MalformedKey(e.to_string()))?;
    match bits.split_first() {
        Some((&0, key)) if !key.is_empty() => Ok(key.to_vec()),
        _ => Err(UicError::MalformedKey(
            "Public key BIT STRING is empty or not octet aligned".to_string(),
        )),
    }
}
