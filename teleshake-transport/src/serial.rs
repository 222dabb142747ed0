//! RS232 transport for Teleshake devices
//!
//! The controller talks 9600 baud, 8 data bits, no parity, one stop bit and
//! no flow control. Reads are non-blocking probes of the input buffer; the
//! protocol layer owns the polling loop and its deadline.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, trace, warn};

use teleshake_core::constants::{BAUD_RATE, SERIAL_READ_TIMEOUT_MS};

use crate::{ConnectionState, Transport, error::*};

/// Serial transport for Teleshake devices
pub struct SerialTransport {
    port_name: String,
    read_timeout: Duration,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Create new serial transport (not yet opened)
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            read_timeout: Duration::from_millis(SERIAL_READ_TIMEOUT_MS),
            stream: None,
        }
    }

    /// Set read timeout of the underlying port
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.is_connected().into()
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {} at {} baud...", self.port_name, BAUD_RATE);

        let stream = tokio_serial::new(self.port_name.as_str(), BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open_native_async()
            .map_err(|source| Error::Open {
                port: self.port_name.clone(),
                source,
            })?;

        debug!("Opened {}", self.port_name);

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.port_name);

            // Port is released on drop; a failed flush must not keep it open
            if let Err(e) = stream.flush().await {
                warn!("Flush on close failed: {}", e);
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), data);

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn read_available(&mut self) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let pending = stream.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(BytesMut::new());
        }

        let mut buf = BytesMut::zeroed(pending);
        let n = stream.read(&mut buf).await?;
        buf.truncate(n);

        trace!("Received {} bytes: {:02X?}", n, &buf[..]);

        Ok(buf)
    }

    fn port_name(&self) -> String {
        self.port_name.clone()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport {} dropped while still connected", self.port_name);
        }
    }
}

/// List serial port names present on this machine
pub fn available_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serial_transport_create() {
        let transport = SerialTransport::new("COM6");
        assert!(!transport.is_connected());
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert_eq!(transport.port_name(), "COM6");
    }

    #[tokio::test]
    async fn test_serial_transport_missing_port() {
        let mut transport = SerialTransport::new("/dev/teleshake-missing-port");

        let result = transport.connect().await;
        assert!(matches!(result, Err(Error::Open { .. })));
        assert!(result.unwrap_err().is_connection_error());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut transport = SerialTransport::new("COM6");
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_io_requires_connection() {
        let mut transport = SerialTransport::new("COM6");

        assert!(matches!(transport.send(&[0x21]).await, Err(Error::NotConnected)));
        assert!(matches!(transport.read_available().await, Err(Error::NotConnected)));
    }
}
