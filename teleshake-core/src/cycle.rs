//! Speed to cycle-time conversion
//!
//! The device is driven by its oscillation period in microseconds, carried as
//! a 24-bit big-endian value in the three data bytes of `SET_CYCLE_TIME`.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::DATA_SIZE;
use crate::constants::speed::{MAX_CYCLE_TIME_US, MICROS_PER_MINUTE, MIN_SPEED};
use crate::error::{Error, Result};

/// Oscillation period in microseconds (24 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleTime(u32);

impl CycleTime {
    /// Create a cycle time from a raw microsecond value
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleTimeOverflow`] if the value needs more than 24 bits.
    pub fn from_micros(micros: u64) -> Result<Self> {
        if micros > u64::from(MAX_CYCLE_TIME_US) {
            return Err(Error::CycleTimeOverflow {
                micros,
                max: MAX_CYCLE_TIME_US,
            });
        }
        Ok(Self(micros as u32))
    }

    /// Derive the cycle time for a speed in shakes per minute
    ///
    /// `cycle_time_us = floor(60_000_000 / speed)`
    ///
    /// # Examples
    ///
    /// ```
    /// use teleshake_core::CycleTime;
    ///
    /// let cycle = CycleTime::from_speed(1200).unwrap();
    /// assert_eq!(cycle.as_micros(), 50_000);
    /// assert_eq!(cycle.to_bytes(), [0, 195, 80]);
    /// ```
    pub fn from_speed(speed: u32) -> Result<Self> {
        if speed < MIN_SPEED {
            return Err(Error::InvalidSpeed {
                speed,
                min: MIN_SPEED,
            });
        }
        Self::from_micros(u64::from(MICROS_PER_MINUTE / speed))
    }

    /// Decode the three data bytes of a telegram
    pub fn from_bytes(bytes: [u8; DATA_SIZE]) -> Self {
        Self(BigEndian::read_u24(&bytes))
    }

    /// Encode as `[high, mid, low]`
    pub fn to_bytes(self) -> [u8; DATA_SIZE] {
        let mut buf = [0u8; DATA_SIZE];
        BigEndian::write_u24(&mut buf, self.0);
        buf
    }

    pub fn as_micros(self) -> u32 {
        self.0
    }

    /// Speed in shakes per minute, `None` for a zero cycle time
    pub fn speed(self) -> Option<u32> {
        MICROS_PER_MINUTE.checked_div(self.0)
    }
}

impl fmt::Display for CycleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Convert a speed into `(high, mid, low)` cycle-time bytes
pub fn speed_to_cycle_bytes(speed: u32) -> Result<(u8, u8, u8)> {
    let [high, mid, low] = CycleTime::from_speed(speed)?.to_bytes();
    Ok((high, mid, low))
}

/// Convert cycle-time bytes back to a speed in shakes per minute
pub fn cycle_bytes_to_speed(high: u8, mid: u8, low: u8) -> Option<u32> {
    CycleTime::from_bytes([high, mid, low]).speed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_speed_1200() {
        assert_eq!(speed_to_cycle_bytes(1200).unwrap(), (0, 195, 80));
    }

    #[test]
    fn test_speed_1300() {
        // 60_000_000 / 1300 = 46153.8 -> 46153 = 0x00B449
        assert_eq!(speed_to_cycle_bytes(1300).unwrap(), (0x00, 0xB4, 0x49));
    }

    #[test]
    fn test_speed_minimum() {
        assert_eq!(speed_to_cycle_bytes(1000).unwrap(), (0x00, 0xEA, 0x60));
    }

    #[test]
    fn test_speed_too_low() {
        assert_eq!(
            speed_to_cycle_bytes(999),
            Err(Error::InvalidSpeed { speed: 999, min: 1000 })
        );
        assert!(matches!(speed_to_cycle_bytes(0), Err(Error::InvalidSpeed { .. })));
    }

    #[test]
    fn test_cycle_time_overflow() {
        assert!(CycleTime::from_micros(0xFF_FFFF).is_ok());
        assert_eq!(
            CycleTime::from_micros(0x100_0000),
            Err(Error::CycleTimeOverflow {
                micros: 0x100_0000,
                max: 0xFF_FFFF,
            })
        );
    }

    #[test]
    fn test_cycle_bytes_to_speed() {
        assert_eq!(cycle_bytes_to_speed(0, 195, 80), Some(1200));
        assert_eq!(cycle_bytes_to_speed(0, 0, 0), None);
    }

    proptest! {
        #[test]
        fn prop_bytes_reassemble(speed in 1000u32..=u32::MAX) {
            let (h, m, l) = speed_to_cycle_bytes(speed).unwrap();
            let reassembled = (u32::from(h) << 16) | (u32::from(m) << 8) | u32::from(l);
            prop_assert_eq!(reassembled, 60_000_000 / speed);
        }

        #[test]
        fn prop_decoded_speed_never_below_requested(speed in 1000u32..=60_000_000) {
            let (h, m, l) = speed_to_cycle_bytes(speed).unwrap();
            let decoded = cycle_bytes_to_speed(h, m, l).unwrap();
            prop_assert!(decoded >= speed);
        }

        #[test]
        fn prop_below_minimum_rejected(speed in 0u32..1000) {
            let rejected = matches!(speed_to_cycle_bytes(speed), Err(Error::InvalidSpeed { .. }));
            prop_assert!(rejected);
        }
    }
}
