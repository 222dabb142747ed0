//! Transport layer for the Teleshake protocol
//!
//! Provides RS232 communication with devices.

pub mod error;
pub mod serial;

pub use error::{Error, Result};
pub use serial::{SerialTransport, available_ports};

use std::fmt;

use async_trait::async_trait;
use bytes::BytesMut;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,

    /// Port open and ready for telegrams
    Connected,
}

impl From<bool> for ConnectionState {
    fn from(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected => f.write_str("connected"),
        }
    }
}

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the channel
    async fn connect(&mut self) -> Result<()>;

    /// Close the channel; closing a closed channel is a no-op
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes, all of them, in order
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Return whatever is buffered right now without waiting for more
    async fn read_available(&mut self) -> Result<BytesMut>;

    /// Get port identifier
    fn port_name(&self) -> String;
}
