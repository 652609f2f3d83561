/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX checksum calculation.
//!
//! The FIX checksum is the sum of every byte preceding the `10=` field modulo
//! 256, rendered as exactly three decimal digits.

/// Calculates the FIX checksum for the given data.
///
/// # Arguments
/// * `data` - The message bytes up to, not including, the `10=` field
///
/// # Example
/// ```
/// use fixprobe_tagvalue::calculate_checksum;
///
/// assert_eq!(calculate_checksum(b"ABC"), 198);
/// ```
#[inline]
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Formats a checksum value as a 3-digit zero-padded string.
#[inline]
#[must_use]
pub fn format_checksum(checksum: u8) -> [u8; 3] {
    [
        b'0' + checksum / 100,
        b'0' + (checksum / 10) % 10,
        b'0' + checksum % 10,
    ]
}

/// Parses a checksum value.
///
/// # Returns
/// `Some(checksum)` when `bytes` is exactly three ASCII digits no greater than 255.
#[inline]
#[must_use]
pub fn parse_checksum(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = bytes
        .iter()
        .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
    u8::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_checksum_wraps() {
        assert_eq!(calculate_checksum(b""), 0);
        let data = vec![255u8; 1000];
        assert_eq!(calculate_checksum(&data), ((255u32 * 1000) % 256) as u8);
    }

    #[test]
    fn test_checksum_of_heartbeat() {
        let body = b"8=FIX.4.4\x019=5\x0135=0\x01";
        let expected = body.iter().map(|&b| u32::from(b)).sum::<u32>() % 256;
        assert_eq!(u32::from(calculate_checksum(body)), expected);
    }

    #[test]
    fn test_format_checksum_pads() {
        assert_eq!(format_checksum(0), *b"000");
        assert_eq!(format_checksum(42), *b"042");
        assert_eq!(format_checksum(255), *b"255");
    }

    #[test]
    fn test_parse_checksum_rejects_bad_input() {
        assert_eq!(parse_checksum(b"042"), Some(42));
        assert_eq!(parse_checksum(b"42"), None);
        assert_eq!(parse_checksum(b"0042"), None);
        assert_eq!(parse_checksum(b"12X"), None);
        assert_eq!(parse_checksum(b"256"), None);
    }
}
