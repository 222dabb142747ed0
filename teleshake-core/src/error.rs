//! Error types for teleshake-core

/// Result type alias for teleshake-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Speed is below the protocol minimum
    #[error("Invalid speed: {speed} (minimum is {min} shakes per minute)")]
    InvalidSpeed {
        speed: u32,
        min: u32,
    },

    /// Cycle time does not fit the 24-bit telegram field
    #[error("Cycle time {micros}us exceeds the 24-bit limit (max {max}us)")]
    CycleTimeOverflow {
        micros: u64,
        max: u32,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:03}, received {actual:03}")]
    ChecksumMismatch {
        expected: u8,
        actual: u8,
    },

    /// Frame does not have telegram length
    #[error("Invalid frame length: expected {expected} bytes, got {actual} bytes")]
    FrameLength {
        expected: usize,
        actual: usize,
    },

    /// Unknown command code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Device address outside 1..=15
    #[error("Invalid device address: {0} (expected 1-15)")]
    InvalidAddress(u8),
}

impl Error {
    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. } | Self::FrameLength { .. })
    }
}
