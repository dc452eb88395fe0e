//! Constraint types and octet-level helpers shared by the UPER encoder and decoder

use uic_core::{UicError, UicResult};

/// Largest length a UPER length determinant can carry without fragmentation
pub const MAX_UNFRAGMENTED_LENGTH: usize = 16383;

/// Size constraint of a string, octet string, bit string or SEQUENCE OF
///
/// `min == max` is a fixed size and is encoded without any length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraint {
    pub min: usize,
    pub max: usize,
}

impl SizeConstraint {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn fixed(size: usize) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Whether the length is carried as a constrained whole number
    ///
    /// X.691 falls back to an unconstrained length determinant once the
    /// upper bound reaches 64K.
    pub fn uses_constrained_length(&self) -> bool {
        self.max < 65536
    }

    pub fn check(&self, length: usize) -> UicResult<()> {
        if length < self.min || length > self.max {
            return Err(UicError::ValueOutOfRange {
                value: length as i64,
                min: self.min as i64,
                max: self.max as i64,
            });
        }
        Ok(())
    }
}

/// Number of bits needed for a constrained whole number in `[min, max]`
///
/// Zero when the range holds a single value.
pub fn bits_for_range(min: i64, max: i64) -> usize {
    let range = (i128::from(max) - i128::from(min)) as u128;
    if range == 0 {
        0
    } else {
        (128 - range.leading_zeros()) as usize
    }
}

/// Minimal big-endian two's complement representation of `value`
///
/// Zero encodes as a single `0x00` octet. A leading `0x00`/`0xFF` is only kept
/// when the sign bit of the next octet would otherwise be misread.
pub fn signed_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Minimal big-endian unsigned representation of `value`, at least one octet
pub fn unsigned_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

/// Interpret big-endian two's complement octets as an `i64`
pub fn signed_from_bytes(bytes: &[u8]) -> UicResult<i64> {
    if bytes.is_empty() {
        return Err(UicError::Structural("Empty integer encoding".to_string()));
    }
    if bytes.len() > 8 {
        return Err(UicError::Unsupported(format!(
            "Integer too large: {} bytes (max 8)",
            bytes.len()
        )));
    }

    let mut value = 0i64;
    for &byte in bytes {
        value = (value << 8) | i64::from(byte);
    }

    if bytes[0] & 0x80 != 0 && bytes.len() < 8 {
        let shift = 64 - bytes.len() * 8;
        value = (value << shift) >> shift;
    }
    Ok(value)
}

/// Interpret big-endian octets as a `u64`
pub fn unsigned_from_bytes(bytes: &[u8]) -> UicResult<u64> {
    if bytes.is_empty() {
        return Err(UicError::Structural("Empty integer encoding".to_string()));
    }
    if bytes.len() > 8 {
        return Err(UicError::Unsupported(format!(
            "Integer too large: {} bytes (max 8)",
            bytes.len()
        )));
    }
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn push_base128(out: &mut Vec<u8>, mut component: u64) {
    let mut groups = vec![(component & 0x7F) as u8];
    component >>= 7;
    while component > 0 {
        groups.push((component & 0x7F) as u8 | 0x80);
        component >>= 7;
    }
    out.extend(groups.iter().rev());
}

/// BER content octets of a dotted OBJECT IDENTIFIER
///
/// The first two arcs are combined as `40 * X + Y`, every arc is written in
/// base 128 with the continuation bit set on all but its last octet.
pub fn oid_to_bytes(oid: &str) -> UicResult<Vec<u8>> {
    let arcs = oid
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| UicError::InvalidString(format!("Invalid OID arc '{}' in {}", part, oid)))
        })
        .collect::<UicResult<Vec<u64>>>()?;

    if arcs.len() < 2 {
        return Err(UicError::InvalidString(format!(
            "Object identifier must have at least 2 arcs: {}",
            oid
        )));
    }
    if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(UicError::InvalidString(format!(
            "Invalid leading arcs in object identifier: {}",
            oid
        )));
    }

    let first = (arcs[0] * 40)
        .checked_add(arcs[1])
        .ok_or_else(|| UicError::InvalidString("OID arc too large".to_string()))?;

    let mut bytes = Vec::new();
    push_base128(&mut bytes, first);
    for &arc in &arcs[2..] {
        push_base128(&mut bytes, arc);
    }
    Ok(bytes)
}

/// Dotted notation of BER OBJECT IDENTIFIER content octets
pub fn oid_from_bytes(bytes: &[u8]) -> UicResult<String> {
    if bytes.is_empty() {
        return Err(UicError::Structural("Empty object identifier encoding".to_string()));
    }

    let mut arcs = Vec::new();
    let mut component = 0u64;
    let mut in_component = false;
    for &byte in bytes {
        if component > (u64::MAX >> 7) {
            return Err(UicError::Structural("OID component overflow".to_string()));
        }
        component = (component << 7) | u64::from(byte & 0x7F);
        in_component = byte & 0x80 != 0;
        if !in_component {
            arcs.push(component);
            component = 0;
        }
    }
    if in_component {
        return Err(UicError::Structural(
            "Truncated object identifier component".to_string(),
        ));
    }

    let first = arcs[0];
    let (x, y) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut parts = vec![x.to_string(), y.to_string()];
    parts.extend(arcs[1..].iter().map(|arc| arc.to_string()));
    Ok(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_for_range() {
        assert_eq!(bits_for_range(5, 5), 0);
        assert_eq!(bits_for_range(0, 1), 1);
        assert_eq!(bits_for_range(2016, 2269), 8);
        assert_eq!(bits_for_range(1, 366), 9);
        assert_eq!(bits_for_range(0, 99999), 17);
        assert_eq!(bits_for_range(i64::MIN, i64::MAX), 64);
    }

    #[test]
    fn test_signed_bytes_minimal() {
        assert_eq!(signed_bytes(0), vec![0x00]);
        assert_eq!(signed_bytes(127), vec![0x7F]);
        assert_eq!(signed_bytes(128), vec![0x00, 0x80]);
        assert_eq!(signed_bytes(-1), vec![0xFF]);
        assert_eq!(signed_bytes(-128), vec![0x80]);
        assert_eq!(signed_bytes(-129), vec![0xFF, 0x7F]);
        assert_eq!(signed_bytes(i64::MIN).len(), 8);
    }

    #[test]
    fn test_signed_from_bytes() {
        assert_eq!(signed_from_bytes(&[0xFF, 0x7F]).unwrap(), -129);
        assert_eq!(signed_from_bytes(&[0x00, 0x80]).unwrap(), 128);
        assert_eq!(signed_from_bytes(&i64::MIN.to_be_bytes()).unwrap(), i64::MIN);
        assert!(signed_from_bytes(&[]).is_err());
        assert!(signed_from_bytes(&[0; 9]).is_err());
    }

    #[test]
    fn test_unsigned_bytes() {
        assert_eq!(unsigned_bytes(0), vec![0x00]);
        assert_eq!(unsigned_bytes(255), vec![0xFF]);
        assert_eq!(unsigned_bytes(256), vec![0x01, 0x00]);
        assert_eq!(unsigned_from_bytes(&[0x01, 0x00]).unwrap(), 256);
    }

    #[test]
    fn test_oid_conversion() {
        let bytes = oid_to_bytes("1.2.840.10045.4.3.2").unwrap();
        assert_eq!(bytes, vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02]);
        assert_eq!(oid_from_bytes(&bytes).unwrap(), "1.2.840.10045.4.3.2");

        let large = oid_to_bytes("2.999.3").unwrap();
        assert_eq!(large, vec![0x88, 0x37, 0x03]);
        assert_eq!(oid_from_bytes(&large).unwrap(), "2.999.3");
    }

    #[test]
    fn test_oid_rejects_malformed() {
        assert!(oid_to_bytes("1").is_err());
        assert!(oid_to_bytes("1.x.3").is_err());
        assert!(oid_to_bytes("1.40").is_err());
        assert!(oid_from_bytes(&[0x2A, 0x86]).is_err());
    }
}
