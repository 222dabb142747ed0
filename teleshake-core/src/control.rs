//! Control byte layout
//!
//! ```text
//! bit   7        6       5       4       3..0
//!     ┌────────┬───────┬───────┬───────┬──────────┐
//!     │ length │ mode  │ dirty │ error │ address  │
//!     │ (0)    │ 1=init│ busy  │       │ 1-15     │
//!     └────────┴───────┴───────┴───────┴──────────┘
//! ```

use std::fmt;

use bitflags::bitflags;

use crate::constants::BROADCAST_ADDRESS;
use crate::error::{Error, Result};

bitflags! {
    /// Flag bits of the control byte (upper nibble)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFlags: u8 {
        /// Device reports an error
        const ERROR = 0x10;
        /// Command pending; cleared by the device once executed
        const DIRTY = 0x20;
        /// Initialization mode
        const INIT = 0x40;
        /// Long telegram (never used, telegrams are always 6 bytes)
        const LONG = 0x80;
    }
}

/// Device address (4 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u8);

impl Address {
    /// Address reaching every device on the line
    pub const BROADCAST: Address = Address(BROADCAST_ADDRESS);

    /// Mask of the address bits
    pub const MASK: u8 = 0x0F;

    /// Create a unicast or broadcast address
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] unless `value` is in `1..=15`.
    pub fn new(value: u8) -> Result<Self> {
        if value == 0 || value > Self::MASK {
            return Err(Error::InvalidAddress(value));
        }
        Ok(Self(value))
    }

    /// Raw address value
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

impl Default for Address {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_ADDRESS)
    }
}

impl TryFrom<u8> for Address {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "{}(broadcast)", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Decoded control byte
///
/// The address is kept as the raw 4-bit field so that any byte received from
/// the device can be represented, including address 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlByte {
    address: u8,
    flags: ControlFlags,
}

impl ControlByte {
    /// Build the control byte for an outgoing command
    ///
    /// The length bit is never set.
    pub fn new(address: Address, init_mode: bool, dirty: bool) -> Self {
        let mut flags = ControlFlags::empty();
        flags.set(ControlFlags::DIRTY, dirty);
        flags.set(ControlFlags::INIT, init_mode);

        Self {
            address: address.value(),
            flags,
        }
    }

    /// Split a raw byte into address and flags
    pub fn from_byte(byte: u8) -> Self {
        Self {
            address: byte & Address::MASK,
            flags: ControlFlags::from_bits_truncate(byte & !Address::MASK),
        }
    }

    pub fn to_byte(self) -> u8 {
        (self.address & Address::MASK) | self.flags.bits()
    }

    pub fn address(self) -> u8 {
        self.address
    }

    pub fn flags(self) -> ControlFlags {
        self.flags
    }

    pub fn is_dirty(self) -> bool {
        self.flags.contains(ControlFlags::DIRTY)
    }

    pub fn is_error(self) -> bool {
        self.flags.contains(ControlFlags::ERROR)
    }

    pub fn is_init_mode(self) -> bool {
        self.flags.contains(ControlFlags::INIT)
    }

    /// Return a copy with the error flag set or cleared
    pub fn with_error(mut self, error: bool) -> Self {
        self.flags.set(ControlFlags::ERROR, error);
        self
    }
}

impl From<ControlByte> for u8 {
    fn from(control: ControlByte) -> u8 {
        control.to_byte()
    }
}

impl From<u8> for ControlByte {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}
