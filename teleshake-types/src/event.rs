//! Structured protocol events
//!
//! The controller reports everything it does as [`ProtocolEvent`]s; sinks
//! decide how to render or persist them.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Timestamped protocol event
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolEvent {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
}

impl ProtocolEvent {
    /// Stamp an event with the current local time
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }
}

impl fmt::Display for ProtocolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"), self.kind)
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ConnectionAttempt { port: String },
    Connected { port: String },
    ConnectionFailed { port: String, reason: String },
    Disconnected { port: String },

    TelegramSent { command: &'static str, bytes: Vec<u8> },
    FrameReceived { command: &'static str, bytes: Vec<u8> },
    ChecksumChecked { command: &'static str, expected: u8, actual: u8 },
    IncompleteResponse { command: &'static str, received: usize },
    UnexpectedResponse { command: &'static str, received: u8 },
    CommandOutcome { command: &'static str, executed: bool },
    TransmissionFailed { command: &'static str, reason: String },
    BroadcastResponse { command: &'static str, bytes: Vec<u8> },
    RawExchange { sent: Vec<u8>, received: Vec<u8> },

    SpeedRejected { speed: u32, reason: String },
    PhaseStarted { index: usize, name: String, speed: u32, duration: Duration, repetitions: u32 },
    RepetitionStarted { phase: usize, repetition: u32, of: u32 },
    Hold { duration: Duration },
    Pause { duration: Duration },
    PhaseCompleted { index: usize },
    SequenceCompleted,
    SequenceAborted { reason: String },
    Interrupted,
}

impl EventKind {
    pub fn is_failure(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::IncompleteResponse { .. }
            | Self::UnexpectedResponse { .. }
            | Self::TransmissionFailed { .. }
            | Self::SpeedRejected { .. }
            | Self::SequenceAborted { .. }
            | Self::Interrupted => true,
            Self::ChecksumChecked { expected, actual, .. } => expected != actual,
            Self::CommandOutcome { executed, .. } => !executed,
            _ => false,
        }
    }
}

struct Decimal<'a>(&'a [u8]);

impl fmt::Display for Decimal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for b in self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{b:03}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionAttempt { port } => write!(f, "Connecting to {port}"),
            Self::Connected { port } => write!(f, "Connected to {port}"),
            Self::ConnectionFailed { port, reason } => {
                write!(f, "Failed to connect to {port}: {reason}")
            }
            Self::Disconnected { port } => write!(f, "Disconnected from {port}"),
            Self::TelegramSent { command, bytes } => {
                write!(f, "{command} sending: {}", Decimal(bytes))
            }
            Self::FrameReceived { command, bytes } => {
                write!(f, "{command} received: {}", Decimal(bytes))
            }
            Self::ChecksumChecked { command, expected, actual } if expected == actual => {
                write!(f, "{command} checksum ok ({actual:03})")
            }
            Self::ChecksumChecked { command, expected, actual } => {
                write!(f, "{command} checksum error! Expected {expected}, got {actual}")
            }
            Self::IncompleteResponse { command, received } => {
                write!(f, "{command} incomplete response: received {received} bytes")
            }
            Self::UnexpectedResponse { command, received } => {
                write!(f, "{command} answered by command {received:03}, response discarded")
            }
            Self::CommandOutcome { command, executed: true } => {
                write!(f, "{command} executed successfully")
            }
            Self::CommandOutcome { command, executed: false } => {
                write!(f, "{command} may not have been executed")
            }
            Self::TransmissionFailed { command, reason } => {
                write!(f, "{command} transmission failed: {reason}")
            }
            Self::BroadcastResponse { command, bytes } if bytes.is_empty() => {
                write!(f, "{command} broadcast: no response")
            }
            Self::BroadcastResponse { command, bytes } => {
                write!(f, "{command} broadcast response: {}", Decimal(bytes))
            }
            Self::RawExchange { sent, received } => write!(
                f,
                "Raw exchange: sent [{}], received {} bytes [{}]",
                Decimal(sent),
                received.len(),
                Decimal(received)
            ),
            Self::SpeedRejected { speed, reason } => {
                write!(f, "Invalid speed {speed}: {reason}")
            }
            Self::PhaseStarted { index, name, speed, duration, repetitions } => write!(
                f,
                "Phase {} ({name}): speed {speed}, {:?} x {repetitions}",
                index + 1,
                duration
            ),
            Self::RepetitionStarted { phase, repetition, of } => {
                write!(f, "Phase {} repetition {repetition}/{of}", phase + 1)
            }
            Self::Hold { duration } => write!(f, "Shaking for {duration:?}"),
            Self::Pause { duration } => write!(f, "Waiting {duration:?}"),
            Self::PhaseCompleted { index } => write!(f, "Phase {} complete", index + 1),
            Self::SequenceCompleted => f.write_str("Shake sequence complete"),
            Self::SequenceAborted { reason } => write!(f, "Aborting sequence: {reason}"),
            Self::Interrupted => f.write_str("Interrupted, stopping device"),
        }
    }
}
