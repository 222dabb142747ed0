//! Teleshake protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
///
/// All commands understood by the Teleshake RS232 controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // Bus management
    QueryAll = 0x20,
    ResetAll = 0x21,
    ResetDevice = 0x22,

    // Device information
    GetInfo = 0x23,
    GetLastError = 0x25,

    // Motion
    StartDevice = 0x30,
    StopDevice = 0x31,
    GetCycleTime = 0x32,
    SetCycleTime = 0x33,
}

impl Command {
    /// Every command, in opcode order
    pub const ALL: [Command; 9] = [
        Self::QueryAll,
        Self::ResetAll,
        Self::ResetDevice,
        Self::GetInfo,
        Self::GetLastError,
        Self::StartDevice,
        Self::StopDevice,
        Self::GetCycleTime,
        Self::SetCycleTime,
    ];

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::QueryAll => "QUERY_ALL",
            Self::ResetAll => "RESET_ALL",
            Self::ResetDevice => "RESET_DEVICE",
            Self::GetInfo => "GET_INFO",
            Self::GetLastError => "GET_LAST_ERROR",
            Self::StartDevice => "START_DEVICE",
            Self::StopDevice => "STOP_DEVICE",
            Self::GetCycleTime => "GET_CYCLE_TIME",
            Self::SetCycleTime => "SET_CYCLE_TIME",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x20 => Ok(Self::QueryAll),
            0x21 => Ok(Self::ResetAll),
            0x22 => Ok(Self::ResetDevice),
            0x23 => Ok(Self::GetInfo),
            0x25 => Ok(Self::GetLastError),
            0x30 => Ok(Self::StartDevice),
            0x31 => Ok(Self::StopDevice),
            0x32 => Ok(Self::GetCycleTime),
            0x33 => Ok(Self::SetCycleTime),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}
