//! Compact index and FString encoders
//!
//! Packages are never written back; these produce byte sequences that
//! [`Ue2Reader`](super::Ue2Reader) decodes bit-exactly, for building
//! synthetic packages.

/// Encode a compact index. Magnitudes must fit in 35 bits.
#[must_use]
pub fn encode_compact_index(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    let mut magnitude = value.unsigned_abs();

    let mut first = (magnitude & 0x3F) as u8;
    if value < 0 {
        first |= 0x80;
    }
    magnitude >>= 6;
    if magnitude > 0 {
        first |= 0x40;
    }
    out.push(first);

    for _ in 0..3 {
        if magnitude == 0 {
            return out;
        }
        let mut byte = (magnitude & 0x7F) as u8;
        magnitude >>= 7;
        if magnitude > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }

    if magnitude > 0 {
        out.push((magnitude & 0xFF) as u8);
    }
    out
}

/// Encode an FString with a trailing NUL.
///
/// Strings that fit in Latin-1 use a positive byte count; anything else is
/// written as UTF-16LE with a negative unit count.
#[must_use]
pub fn encode_fstring(text: &str) -> Vec<u8> {
    if text.chars().all(|c| u32::from(c) <= 0xFF) {
        let count = text.chars().count() as i64 + 1;
        let mut out = encode_compact_index(count);
        out.extend(text.chars().map(|c| u32::from(c) as u8));
        out.push(0);
        out
    } else {
        let units: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        let mut out = encode_compact_index(-(units.len() as i64));
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_small_values() {
        assert_eq!(encode_compact_index(5), vec![0x05]);
        assert_eq!(encode_compact_index(-5), vec![0x85]);
        assert_eq!(encode_compact_index(0), vec![0x00]);
        assert_eq!(encode_compact_index(63), vec![0x3F]);
    }

    #[test]
    fn test_encode_continuation() {
        // 0x40 continuation | 0x24 low bits, then the remaining 1
        assert_eq!(encode_compact_index(100), vec![0x64, 0x01]);
        assert_eq!(encode_compact_index(64), vec![0x40, 0x01]);
        assert_eq!(encode_compact_index(-8192), vec![0xC0, 0x80, 0x01]);
    }

    #[test]
    fn test_encode_uses_five_bytes_at_bit_27() {
        assert_eq!(encode_compact_index((1 << 27) - 1).len(), 4);
        assert_eq!(encode_compact_index(1 << 27).len(), 5);
    }

    #[test]
    fn test_encode_fstring_utf16_terminated() {
        let bytes = encode_fstring("\u{65E5}");
        // -2 units: the character and the terminator
        assert_eq!(bytes, vec![0x82, 0xE5, 0x65, 0x00, 0x00]);
    }
}
