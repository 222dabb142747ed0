//! Type definitions for teleshake

pub mod config;
pub mod error;
pub mod event;
pub mod phase;

pub use config::DeviceConfig;
pub use error::{Error, Result};
pub use event::{EventKind, ProtocolEvent};
pub use phase::Phase;
