//! Teleshake checksum algorithm
//!
//! The last byte of every telegram is the modulo-256 sum of the five bytes
//! before it (control, command, data2, data1, data0).

use tracing::trace;

/// Number of leading bytes covered by the checksum
pub const COVERED_BYTES: usize = 5;

/// Calculate telegram checksum
///
/// Only the first five bytes are summed; anything past them is ignored so a
/// complete six-byte frame can be passed directly.
///
/// # Examples
///
/// ```
/// use teleshake_core::checksum;
///
/// assert_eq!(checksum::calculate(&[0x21, 0x30, 0, 0, 0]), 0x51);
/// ```
pub fn calculate(bytes: &[u8]) -> u8 {
    let checksum = bytes
        .iter()
        .take(COVERED_BYTES)
        .fold(0u8, |sum, &b| sum.wrapping_add(b));

    trace!(
        bytes = %hex::encode(&bytes[..bytes.len().min(COVERED_BYTES)]),
        checksum,
        "Calculated checksum"
    );

    checksum
}

/// Verify checksum
pub fn verify(bytes: &[u8], expected: u8) -> bool {
    calculate(bytes) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_start_command() {
        assert_eq!(calculate(&[0x21, 0x30, 0, 0, 0]), 0x51);
    }

    #[test]
    fn test_checksum_wraps_modulo_256() {
        // 0xFF * 5 = 1275 = 4 * 256 + 251
        assert_eq!(calculate(&[0xFF; 5]), 251);
    }

    #[test]
    fn test_checksum_ignores_trailing_bytes() {
        let frame = [0x21, 0x33, 0x00, 0xC3, 0x50, 0xAA];
        assert_eq!(calculate(&frame), calculate(&frame[..5]));
    }

    #[test]
    fn test_checksum_verify() {
        let body = [0x6F, 0x20, 0, 0, 0];
        let checksum = calculate(&body);

        assert!(verify(&body, checksum));
        assert!(!verify(&body, checksum.wrapping_add(1)));
    }

    #[test]
    fn test_checksum_empty() {
        assert_eq!(calculate(&[]), 0);
    }
}
