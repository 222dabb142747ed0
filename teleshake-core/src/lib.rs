//! # teleshake-core
//!
//! Core protocol implementation for H+P Labortechnik Teleshake devices.
//!
//! This crate provides the low-level protocol primitives:
//! - Telegram structure and encoding/decoding
//! - Control byte layout
//! - Checksum calculation
//! - Command definitions
//! - Speed to cycle-time conversion

pub mod checksum;
pub mod command;
pub mod constants;
pub mod control;
pub mod cycle;
pub mod error;
pub mod telegram;

pub use command::Command;
pub use control::{Address, ControlByte, ControlFlags};
pub use cycle::{CycleTime, cycle_bytes_to_speed, speed_to_cycle_bytes};
pub use error::{Error, Result};
pub use telegram::{Frame, Response, Telegram, decode, encode};

/// Telegram size in bytes (requests and responses)
pub const TELEGRAM_SIZE: usize = 6;

/// Number of data bytes carried by a telegram
pub const DATA_SIZE: usize = 3;
