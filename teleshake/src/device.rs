//! Device command protocol
//!
//! One command is in flight at a time: leftover input is discarded, the
//! telegram is written, the line is given a settle delay, then the input
//! buffer is probed at a fixed interval until six bytes arrived or the
//! response deadline passed. A reply must carry the command code it answers.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace, warn};

use teleshake_core::{
    Address, Command, CycleTime, DATA_SIZE, Frame, Response, TELEGRAM_SIZE, Telegram,
};
use teleshake_transport::{ConnectionState, SerialTransport, Transport};
use teleshake_types::{DeviceConfig, EventKind, ProtocolEvent};

use crate::error::{Error, Result};
use crate::sink::{EventSink, TracingSink};

/// Teleshake device
///
/// High-level interface for a single shaker on a serial line.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use teleshake::Device;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> teleshake::Result<()> {
///     let mut device = Device::new("/dev/ttyUSB0");
///
///     device.connect().await?;
///     device.initialize().await?;
///
///     device.shake_for(1200, Duration::from_secs(5)).await;
///
///     device.close().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    sink: Box<dyn EventSink>,
    config: DeviceConfig,
    address: Address,
    // START_DEVICE went out and no STOP_DEVICE was acknowledged since
    needs_stop: bool,
}

impl Device {
    /// Create a new device instance on a serial port
    pub fn new(port: impl Into<String>) -> Self {
        let port = port.into();
        let config = DeviceConfig::default().with_port(port.clone());
        Self::build(Box::new(SerialTransport::new(port)), config)
    }

    /// Create a device from a validated configuration (serial transport)
    pub fn from_config(config: DeviceConfig) -> Result<Self> {
        Self::new(config.port.clone()).with_config(config)
    }

    /// Create a device on a custom transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        let config = DeviceConfig::default().with_port(transport.port_name());
        Self::build(transport, config)
    }

    fn build(transport: Box<dyn Transport>, config: DeviceConfig) -> Self {
        Self {
            transport,
            sink: Box::new(TracingSink),
            config,
            address: Address::default(),
            needs_stop: false,
        }
    }

    /// Replace timing, address and program settings
    ///
    /// The port field is informational here; the transport is already chosen.
    pub fn with_config(mut self, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        self.address = Address::new(config.device_address)?;
        self.config = config;
        Ok(self)
    }

    /// Set the event sink (default: [`TracingSink`])
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn port_name(&self) -> String {
        self.transport.port_name()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.is_connected().into()
    }

    /// Whether a start was issued without an acknowledged stop
    pub fn may_be_running(&self) -> bool {
        self.needs_stop
    }

    /// Open the serial line
    ///
    /// # Errors
    ///
    /// Returns a transport error if the port is busy, missing or not
    /// accessible. No telegram is sent in that case.
    pub async fn connect(&mut self) -> Result<()> {
        let port = self.transport.port_name();
        self.emit(EventKind::ConnectionAttempt { port: port.clone() });

        match self.transport.connect().await {
            Ok(()) => {
                self.emit(EventKind::Connected { port });
                Ok(())
            }
            Err(e) => {
                self.emit(EventKind::ConnectionFailed {
                    port,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Close the serial line; a no-op when already closed
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            return Ok(());
        }

        self.transport.disconnect().await?;
        self.emit(EventKind::Disconnected {
            port: self.transport.port_name(),
        });
        Ok(())
    }

    /// Stop the device if it may still be running, then disconnect
    pub async fn close(&mut self) -> Result<()> {
        if self.needs_stop && self.is_connected() {
            if let Err(e) = self.try_stop().await {
                warn!("Failed to stop device before closing: {}", e);
            }
        }
        self.disconnect().await
    }

    /// Send one command and wait for its six-byte response
    ///
    /// A response with the dirty bit still set is returned as-is
    /// (`Response::is_executed() == false`); use [`Device::send_confirmed`]
    /// to treat it as an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] before [`Device::connect`]
    /// - transport error if the write fails
    /// - [`Error::IncompleteResponse`] if fewer than six bytes arrive in time
    /// - checksum mismatch if the frame is corrupted
    /// - [`Error::UnexpectedResponse`] if the frame answers another command
    pub async fn send_command(
        &mut self,
        command: Command,
        data: Option<[u8; DATA_SIZE]>,
    ) -> Result<Response> {
        self.ensure_connected()?;
        self.discard_stale().await?;

        let telegram = Telegram::new(self.address, command, data.unwrap_or_default());
        if command == Command::StartDevice {
            self.needs_stop = true;
        }
        self.transmit(&telegram).await?;

        sleep(self.config.settle_delay).await;
        let buf = self
            .collect(Some(TELEGRAM_SIZE), self.config.response_timeout)
            .await?;

        if buf.len() < TELEGRAM_SIZE {
            self.emit(EventKind::IncompleteResponse {
                command: command.name(),
                received: buf.len(),
            });
            return Err(Error::IncompleteResponse {
                command,
                received: buf.len(),
            });
        }
        if buf.len() > TELEGRAM_SIZE {
            debug!(
                "Discarding {} bytes after the {} response",
                buf.len() - TELEGRAM_SIZE,
                command.name()
            );
        }

        let frame = Frame::from_slice(&buf[..TELEGRAM_SIZE])?;
        self.emit(EventKind::FrameReceived {
            command: command.name(),
            bytes: frame.as_bytes().to_vec(),
        });
        self.emit(EventKind::ChecksumChecked {
            command: command.name(),
            expected: frame.expected_checksum(),
            actual: frame.received_checksum(),
        });

        let response = frame.validate()?;
        if response.command_code() != u8::from(command) {
            self.emit(EventKind::UnexpectedResponse {
                command: command.name(),
                received: response.command_code(),
            });
            return Err(Error::UnexpectedResponse {
                command,
                received: response.command_code(),
            });
        }
        self.emit(EventKind::CommandOutcome {
            command: command.name(),
            executed: response.is_executed(),
        });

        if command == Command::StopDevice {
            self.needs_stop = false;
        }

        trace!("Received: {}", response);
        Ok(response)
    }

    /// Like [`Device::send_command`] but a set dirty bit is an error
    pub async fn send_confirmed(
        &mut self,
        command: Command,
        data: Option<[u8; DATA_SIZE]>,
    ) -> Result<Response> {
        let response = self.send_command(command, data).await?;
        if !response.is_executed() {
            return Err(Error::CommandNotConfirmed { command });
        }
        Ok(response)
    }

    /// Broadcast `QUERY_ALL` in initialization mode
    ///
    /// Broadcast replies have no fixed length, so any byte received within
    /// the init window counts. Returns whether anything arrived.
    pub async fn initialize(&mut self) -> Result<bool> {
        self.broadcast(Telegram::broadcast_init(Command::QueryAll)).await
    }

    /// Broadcast `RESET_ALL` to every device on the line
    pub async fn reset_all(&mut self) -> Result<bool> {
        let telegram =
            Telegram::with_mode(Address::BROADCAST, Command::ResetAll, [0; DATA_SIZE], false, true);
        self.broadcast(telegram).await
    }

    /// Reset this device
    pub async fn reset_device(&mut self) -> Result<Response> {
        self.send_command(Command::ResetDevice, None).await
    }

    /// Read the device information word
    pub async fn get_info(&mut self) -> Result<Response> {
        self.send_command(Command::GetInfo, None).await
    }

    /// Read the last error code
    pub async fn get_last_error(&mut self) -> Result<Response> {
        self.send_command(Command::GetLastError, None).await
    }

    /// Read the cycle time the device is currently set to
    pub async fn get_cycle_time(&mut self) -> Result<CycleTime> {
        let response = self.send_command(Command::GetCycleTime, None).await?;
        Ok(CycleTime::from_bytes(response.data()))
    }

    /// Write arbitrary bytes and capture everything received within `window`
    ///
    /// Nothing is validated; this is a line-level diagnostic.
    pub async fn send_raw(&mut self, bytes: &[u8], window: Duration) -> Result<BytesMut> {
        self.ensure_connected()?;

        self.transport.send(bytes).await?;
        sleep(self.config.settle_delay).await;
        let received = self.collect(None, window).await?;

        self.emit(EventKind::RawExchange {
            sent: bytes.to_vec(),
            received: received.to_vec(),
        });
        Ok(received)
    }

    // Helper methods

    pub(crate) fn emit(&self, kind: EventKind) {
        self.sink.record(ProtocolEvent::now(kind));
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn transmit(&mut self, telegram: &Telegram) -> Result<()> {
        let bytes = telegram.encode();
        let command = telegram.command().name();

        trace!("Sending: {:?}", telegram);
        self.emit(EventKind::TelegramSent {
            command,
            bytes: bytes.to_vec(),
        });

        if let Err(e) = self.transport.send(&bytes).await {
            self.emit(EventKind::TransmissionFailed {
                command,
                reason: e.to_string(),
            });
            return Err(e.into());
        }
        Ok(())
    }

    async fn broadcast(&mut self, telegram: Telegram) -> Result<bool> {
        self.ensure_connected()?;
        self.discard_stale().await?;

        self.transmit(&telegram).await?;
        sleep(self.config.settle_delay).await;
        let received = self.collect(None, self.config.init_window).await?;

        self.emit(EventKind::BroadcastResponse {
            command: telegram.command().name(),
            bytes: received.to_vec(),
        });
        Ok(!received.is_empty())
    }

    /// Drop input nobody waited for, such as the late reply to a command that
    /// already timed out
    async fn discard_stale(&mut self) -> Result<()> {
        let stale = self.transport.read_available().await?;
        if !stale.is_empty() {
            debug!("Discarding {} stale bytes: {:02X?}", stale.len(), &stale[..]);
        }
        Ok(())
    }

    /// Probe the input buffer until `limit` bytes arrived or `window` elapsed
    ///
    /// Always probes at least once, so a zero window is a single read.
    async fn collect(&mut self, limit: Option<usize>, window: Duration) -> Result<BytesMut> {
        let deadline = Instant::now() + window;
        let mut buf = BytesMut::with_capacity(TELEGRAM_SIZE);

        loop {
            let chunk = self.transport.read_available().await?;
            buf.extend_from_slice(&chunk);

            if limit.is_some_and(|n| buf.len() >= n) {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(self.config.probe_interval.min(deadline - now)).await;
        }

        Ok(buf)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.needs_stop && self.is_connected() {
            warn!("Device on {} dropped while it may still be shaking", self.port_name());
        }
    }
}
