//! # teleshake
//!
//! Controller for H+P Labortechnik Teleshake shakers over RS232.
//!
//! ## Features
//!
//! - Checksummed six-byte telegrams with dirty-bit confirmation
//! - Async/await API using Tokio
//! - Shake sequences with guaranteed stop on failure or interrupt
//! - Structured protocol events through pluggable sinks
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use teleshake::{Device, Phase};
//!
//! #[tokio::main]
//! async fn main() -> teleshake::Result<()> {
//!     let mut device = Device::new("COM6");
//!     device.connect().await?;
//!     device.initialize().await?;
//!
//!     let program = vec![Phase::new(1200, Duration::from_secs(5)).with_repetitions(3)];
//!     let ok = device.run_sequence(&program).await;
//!     println!("sequence ok: {ok}");
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod sequence;
pub mod sink;

// Re-exports
pub use device::Device;
pub use error::{Error, Result};
pub use sink::{EventSink, MemorySink, TracingSink};

// Re-export types
pub use teleshake_core::{Address, Command, CycleTime, Response, Telegram};
pub use teleshake_transport::{ConnectionState, SerialTransport, Transport, available_ports};
pub use teleshake_types::{DeviceConfig, EventKind, Phase, ProtocolEvent};
