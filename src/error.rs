//! Unified error types for the Orion firmware.
//!
//! Three families cover everything the controller can fail at: operator or
//! broker input that does not parse (`ValidationError`), network sinks that
//! are down right now but may come back (`TransientError`), and sensor reads
//! that produced nothing usable (`HardwareReadInvalid`). All variants are
//! `Copy` so they travel through the mode controller without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A command or inbound message was rejected. No state changed.
    Validation(ValidationError),
    /// A network sink or transport is temporarily unavailable.
    Transient(TransientError),
    /// A sensor read produced no usable value.
    HardwareRead(HardwareReadInvalid),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Transient(e) => write!(f, "transient: {e}"),
            Self::HardwareRead(e) => write!(f, "hardware read: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// First token of a console line names no known category.
    UnknownCategory,
    /// Category is known but the action is not.
    UnknownAction,
    /// Relay index outside 1..=4.
    UnknownRelay,
    /// Servo index outside 1..=3.
    UnknownServo,
    /// Level token is neither `on` nor `off`.
    InvalidLevel,
    /// Angle token is not an integer.
    InvalidAngle,
    /// Inbound broker topic matches no command topic.
    UnknownTopic,
    /// Inbound broker payload is not a recognised command word.
    InvalidPayload,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory => write!(f, "unrecognized command"),
            Self::UnknownAction => write!(f, "unknown action"),
            Self::UnknownRelay => write!(f, "unknown relay (use 1-4)"),
            Self::UnknownServo => write!(f, "unknown servo (use 1-3)"),
            Self::InvalidLevel => write!(f, "invalid level (use on/off)"),
            Self::InvalidAngle => write!(f, "invalid angle (use 0-180)"),
            Self::UnknownTopic => write!(f, "unknown topic"),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Transient errors
// ---------------------------------------------------------------------------

/// Network-side failures. Logged and retried on the next scheduled
/// attempt, never inside the failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    BrokerUnreachable,
    BrokerPublishFailed,
    BrokerSubscribeFailed,
    StoreUnreachable,
    StoreWriteFailed,
    ConsoleUnavailable,
    TimeSyncFailed,
    AdvertiseFailed,
}

impl fmt::Display for TransientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokerUnreachable => write!(f, "broker unreachable"),
            Self::BrokerPublishFailed => write!(f, "broker publish failed"),
            Self::BrokerSubscribeFailed => write!(f, "broker subscribe failed"),
            Self::StoreUnreachable => write!(f, "time-series store unreachable"),
            Self::StoreWriteFailed => write!(f, "time-series write failed"),
            Self::ConsoleUnavailable => write!(f, "console transport unavailable"),
            Self::TimeSyncFailed => write!(f, "time sync failed"),
            Self::AdvertiseFailed => write!(f, "mDNS advertisement failed"),
        }
    }
}

impl From<TransientError> for Error {
    fn from(e: TransientError) -> Self {
        Self::Transient(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware read errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareReadInvalid {
    /// Climate driver returned a non-zero status code.
    ClimateStatus(i32),
    /// GPS decoder has no valid fix yet.
    NoGpsFix,
}

impl fmt::Display for HardwareReadInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClimateStatus(code) => write!(f, "climate status {code}"),
            Self::NoGpsFix => write!(f, "no GPS fix"),
        }
    }
}

impl From<HardwareReadInvalid> for Error {
    fn from(e: HardwareReadInvalid) -> Self {
        Self::HardwareRead(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value the controller cannot run with.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(field) => write!(f, "invalid value for {field}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
