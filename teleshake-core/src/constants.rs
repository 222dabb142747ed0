//! Protocol constants

/// Serial line baud rate
pub const BAUD_RATE: u32 = 9600;

/// Default serial port identifier
pub const DEFAULT_PORT: &str = "COM6";

/// Default unicast device address
pub const DEFAULT_ADDRESS: u8 = 1;

/// Broadcast device address
pub const BROADCAST_ADDRESS: u8 = 0x0F;

/// Default time to wait for a complete response (milliseconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2000;

/// Default delay between transmission and the first read (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Default idle delay between buffer probes (milliseconds)
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 10;

/// Default window for collecting broadcast responses (milliseconds)
pub const DEFAULT_INIT_WINDOW_MS: u64 = 500;

/// Serial read timeout (milliseconds)
pub const SERIAL_READ_TIMEOUT_MS: u64 = 100;

/// Speed limits and conversion
pub mod speed {
    /// Microseconds per minute
    pub const MICROS_PER_MINUTE: u32 = 60_000_000;

    /// Lowest accepted speed (shakes per minute)
    pub const MIN_SPEED: u32 = 1000;

    /// Largest cycle time expressible in the three data bytes
    pub const MAX_CYCLE_TIME_US: u32 = 0x00FF_FFFF;
}
