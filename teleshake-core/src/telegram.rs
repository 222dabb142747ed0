//! Teleshake telegram structure and encoding/decoding

use std::fmt;

use crate::{
    DATA_SIZE, TELEGRAM_SIZE, checksum,
    command::Command,
    control::{Address, ControlByte},
    error::{Error, Result},
};

/// Outgoing Teleshake telegram
///
/// # Telegram Structure
///
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┬──────────┐
/// │ Control │ Command │  Data2  │  Data1  │  Data0  │ Checksum │
/// │ 1 byte  │ 1 byte  │ 1 byte  │ 1 byte  │ 1 byte  │  1 byte  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┴──────────┘
/// ```
///
/// Multi-byte data values are big-endian (Data2 is the most significant byte).
/// The checksum is the modulo-256 sum of the first five bytes.
///
/// # Examples
///
/// ```
/// use teleshake_core::{Address, Command, Telegram};
///
/// let telegram = Telegram::new(Address::new(1).unwrap(), Command::StartDevice, [0, 0, 0]);
/// assert_eq!(telegram.encode(), [0x21, 0x30, 0x00, 0x00, 0x00, 0x51]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Telegram {
    control: ControlByte,
    command: Command,
    data: [u8; DATA_SIZE],
}

impl Telegram {
    /// Create a normal-mode command telegram with the dirty bit set
    pub fn new(address: Address, command: Command, data: [u8; DATA_SIZE]) -> Self {
        Self::with_mode(address, command, data, false, true)
    }

    /// Create a telegram with explicit mode and dirty flags
    pub fn with_mode(
        address: Address,
        command: Command,
        data: [u8; DATA_SIZE],
        init_mode: bool,
        dirty: bool,
    ) -> Self {
        Self {
            control: ControlByte::new(address, init_mode, dirty),
            command,
            data,
        }
    }

    /// Create an initialization telegram addressed to every device
    pub fn broadcast_init(command: Command) -> Self {
        Self::with_mode(Address::BROADCAST, command, [0; DATA_SIZE], true, true)
    }

    pub fn control(&self) -> ControlByte {
        self.control
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn data(&self) -> [u8; DATA_SIZE] {
        self.data
    }

    /// Calculate checksum for this telegram
    pub fn checksum(&self) -> u8 {
        checksum::calculate(&self.body())
    }

    /// Encode telegram to its six wire bytes
    pub fn encode(&self) -> [u8; TELEGRAM_SIZE] {
        let [control, command, d2, d1, d0] = self.body();
        [control, command, d2, d1, d0, self.checksum()]
    }

    fn body(&self) -> [u8; checksum::COVERED_BYTES] {
        let [d2, d1, d0] = self.data;
        [self.control.to_byte(), self.command.into(), d2, d1, d0]
    }
}

impl fmt::Debug for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telegram")
            .field("command", &self.command)
            .field("address", &self.control.address())
            .field("flags", &self.control.flags())
            .field("data", &format!("{:02X?}", self.data))
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .finish()
    }
}

impl fmt::Display for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, &self.encode())
    }
}

/// Raw six-byte frame as read from the line, before checksum validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; TELEGRAM_SIZE]);

impl Frame {
    pub fn new(bytes: [u8; TELEGRAM_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a frame from a slice of exactly six bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameLength`] for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; TELEGRAM_SIZE] = bytes.try_into().map_err(|_| Error::FrameLength {
            expected: TELEGRAM_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; TELEGRAM_SIZE] {
        &self.0
    }

    /// Checksum computed over the first five bytes
    pub fn expected_checksum(&self) -> u8 {
        checksum::calculate(&self.0)
    }

    /// Checksum carried in the sixth byte
    pub fn received_checksum(&self) -> u8 {
        self.0[TELEGRAM_SIZE - 1]
    }

    pub fn is_checksum_valid(&self) -> bool {
        self.expected_checksum() == self.received_checksum()
    }

    /// Validate the checksum and turn the frame into a [`Response`]
    pub fn validate(self) -> Result<Response> {
        if !self.is_checksum_valid() {
            return Err(Error::ChecksumMismatch {
                expected: self.expected_checksum(),
                actual: self.received_checksum(),
            });
        }
        Ok(Response { frame: self })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, &self.0)
    }
}

/// Checksum-valid response telegram from the device
///
/// The command byte is kept raw; use [`Response::command`] to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Response {
    frame: Frame,
}

impl Response {
    /// Decode a response from bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is not exactly 6 bytes
    /// - Checksum verification fails
    ///
    /// # Examples
    ///
    /// ```
    /// use teleshake_core::Response;
    ///
    /// let response = Response::decode(&[0x01, 0x30, 0, 0, 0, 0x31]).unwrap();
    /// assert!(response.is_executed());
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Frame::from_slice(bytes)?.validate()
    }

    pub fn control(&self) -> ControlByte {
        ControlByte::from_byte(self.frame.0[0])
    }

    pub fn address(&self) -> u8 {
        self.control().address()
    }

    /// Raw command byte
    pub fn command_code(&self) -> u8 {
        self.frame.0[1]
    }

    /// Interpret the command byte
    pub fn command(&self) -> Result<Command> {
        Command::try_from(self.command_code())
    }

    pub fn data(&self) -> [u8; DATA_SIZE] {
        [self.frame.0[2], self.frame.0[3], self.frame.0[4]]
    }

    pub fn checksum(&self) -> u8 {
        self.frame.received_checksum()
    }

    /// Dirty bit cleared: the device executed the command
    pub fn is_executed(&self) -> bool {
        !self.control().is_dirty()
    }

    /// Error flag raised by the device
    pub fn is_error(&self) -> bool {
        self.control().is_error()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn to_bytes(&self) -> [u8; TELEGRAM_SIZE] {
        self.frame.0
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, &self.frame.0)
    }
}

/// Build the wire bytes for a command
pub fn encode(
    address: Address,
    command: Command,
    data: [u8; DATA_SIZE],
    init_mode: bool,
    dirty: bool,
) -> [u8; TELEGRAM_SIZE] {
    Telegram::with_mode(address, command, data, init_mode, dirty).encode()
}

/// Validate and decode a six-byte response
pub fn decode(bytes: &[u8; TELEGRAM_SIZE]) -> Result<Response> {
    Frame::new(*bytes).validate()
}

// Decimal rendering used by the vendor tooling: "033 048 000 000 000 081"
fn write_decimal(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{b:03}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn addr(value: u8) -> Address {
        Address::new(value).unwrap()
    }

    #[test]
    fn test_encode_start_device() {
        let bytes = encode(addr(1), Command::StartDevice, [0, 0, 0], false, true);
        assert_eq!(bytes, [0x21, 0x30, 0x00, 0x00, 0x00, 0x51]);
    }

    #[test]
    fn test_encode_set_cycle_time() {
        let telegram = Telegram::new(addr(1), Command::SetCycleTime, [0, 195, 80]);
        let bytes = telegram.encode();

        assert_eq!(&bytes[..5], &[0x21, 0x33, 0, 195, 80]);
        assert_eq!(bytes[5], (0x21u32 + 0x33 + 195 + 80) as u8);
    }

    #[test]
    fn test_broadcast_init() {
        let bytes = Telegram::broadcast_init(Command::QueryAll).encode();
        assert_eq!(bytes, [0x6F, 0x20, 0, 0, 0, 0x8F]);
    }

    #[test]
    fn test_decode_executed_response() {
        let response = decode(&[0x01, 0x30, 0, 0, 0, 0x31]).unwrap();

        assert_eq!(response.address(), 1);
        assert_eq!(response.command().unwrap(), Command::StartDevice);
        assert!(response.is_executed());
        assert!(!response.is_error());
    }

    #[test]
    fn test_decode_dirty_response() {
        let response = decode(&[0x21, 0x30, 0, 0, 0, 0x51]).unwrap();
        assert!(!response.is_executed());
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let result = decode(&[0x01, 0x30, 0, 0, 0, 0x32]);
        assert_eq!(
            result,
            Err(Error::ChecksumMismatch {
                expected: 0x31,
                actual: 0x32,
            })
        );
    }

    #[test]
    fn test_decode_short_frame() {
        let result = Response::decode(&[0x01, 0x30, 0]);
        assert_eq!(
            result,
            Err(Error::FrameLength {
                expected: 6,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_unknown_response_command_still_decodes() {
        let response = decode(&[0x01, 0x7E, 0, 0, 0, 0x7F]).unwrap();
        assert_eq!(response.command_code(), 0x7E);
        assert!(response.command().is_err());
    }

    #[test]
    fn test_display_decimal() {
        let telegram = Telegram::new(addr(1), Command::StartDevice, [0, 0, 0]);
        assert_eq!(telegram.to_string(), "033 048 000 000 000 081");
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            address in 1u8..=15,
            index in 0usize..Command::ALL.len(),
            data in any::<[u8; 3]>(),
            init_mode in any::<bool>(),
            dirty in any::<bool>(),
        ) {
            let command = Command::ALL[index];
            let bytes = encode(addr(address), command, data, init_mode, dirty);
            let response = decode(&bytes).unwrap();

            prop_assert_eq!(response.address(), address);
            prop_assert_eq!(response.command().unwrap(), command);
            prop_assert_eq!(response.data(), data);
            prop_assert_eq!(response.is_executed(), !dirty);
            prop_assert!(response.frame().is_checksum_valid());
        }

        #[test]
        fn prop_checksum_flag_matches_sum(bytes in any::<[u8; 6]>()) {
            let frame = Frame::new(bytes);
            let sum = bytes[..5].iter().map(|&b| u32::from(b)).sum::<u32>() % 256;
            prop_assert_eq!(frame.is_checksum_valid(), u32::from(bytes[5]) == sum);
            prop_assert_eq!(decode(&bytes).is_ok(), u32::from(bytes[5]) == sum);
        }
    }
}
