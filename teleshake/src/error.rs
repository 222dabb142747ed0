//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] teleshake_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] teleshake_transport::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] teleshake_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Incomplete response to {command}: received {received} of 6 bytes")]
    IncompleteResponse {
        command: teleshake_core::Command,
        received: usize,
    },

    #[error("Response to {command} carries command code 0x{received:02X}")]
    UnexpectedResponse {
        command: teleshake_core::Command,
        received: u8,
    },

    #[error("{command} accepted but not confirmed (dirty bit still set)")]
    CommandNotConfirmed {
        command: teleshake_core::Command,
    },

    #[error("Operation interrupted")]
    Interrupted,
}

impl Error {
    /// Port could not be opened; nothing was sent
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connection_error())
    }

    /// Write failed mid-command; the session is suspect
    pub fn is_transmission_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(
                teleshake_transport::Error::Io(_) | teleshake_transport::Error::Serial(_)
            )
        )
    }

    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::IncompleteResponse { .. }
            | Self::UnexpectedResponse { .. }
            | Self::CommandNotConfirmed { .. } => true,
            Self::Core(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::NotConnected) || self.is_transmission_error()
    }
}
