//! Unified error types for the tankflow firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the task
//! loops handle failures uniformly.  Every variant is `Copy`: errors are
//! logged and dropped at the point they occur and never unwind a task.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// Network, protocol or serial link failure.
    Comms(CommsError),
    /// An inbound command frame was rejected.
    Command(CommandError),
    /// The outbound mailbox refused a message.
    Queue(QueueError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration field out of range.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed,
    /// GPIO read or write returned an error.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The network layer (WiFi) is not up.
    NetworkDown,
    /// A network connect attempt failed.
    NetworkConnectFailed,
    /// A protocol (MQTT) connect attempt failed or is still pending.
    ProtocolConnectFailed,
    /// The protocol session is not established.
    ProtocolDown,
    /// The broker refused or the client could not enqueue a publish.
    PublishFailed,
    /// Writing to the serial link failed.
    SerialWriteFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkDown => write!(f, "network down"),
            Self::NetworkConnectFailed => write!(f, "network connect failed"),
            Self::ProtocolConnectFailed => write!(f, "protocol connect failed"),
            Self::ProtocolDown => write!(f, "protocol session down"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SerialWriteFailed => write!(f, "serial write failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Inbound command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The frame contains no `{`.
    NoJson,
    /// The JSON could not be parsed.
    Malformed,
    /// The object has no string `cmd` field.
    MissingCommand,
    /// `cmd` names no known handler.
    UnknownCommand,
    /// The command has no usable `value` field.
    MissingValue,
    /// A numeric value is outside its accepted range.
    OutOfRange(i64),
    /// A mode name is not one of the known modes.
    InvalidMode,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJson => write!(f, "no JSON object in frame"),
            Self::Malformed => write!(f, "malformed JSON"),
            Self::MissingCommand => write!(f, "missing cmd"),
            Self::UnknownCommand => write!(f, "unknown cmd"),
            Self::MissingValue => write!(f, "missing value"),
            Self::OutOfRange(v) => write!(f, "value {v} out of range"),
            Self::InvalidMode => write!(f, "invalid mode"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Mailbox errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The mailbox is at capacity; the new message was dropped.
    Full,
    /// The topic does not fit in a mailbox slot.
    TopicTooLong,
    /// The payload does not fit in a mailbox slot.
    PayloadTooLong,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "mailbox full"),
            Self::TopicTooLong => write!(f, "topic too long"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
