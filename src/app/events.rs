//! Outbound application events.
//!
//! The mode controller and its sessions emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use crate::cloud::connectivity::ConnectionState;
use crate::error::{Error, TransientError, ValidationError};
use crate::mode::OperatingMode;
use crate::sensors::SensorSample;

/// Who changed the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSource {
    Console,
    Broker,
    SafetyTimer,
    SelfTest,
    ModeExit,
}

/// Where a rejected command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Console,
    Broker,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A mode finished its entry sequence and owns the hardware.
    ModeEntered(OperatingMode),

    /// A mode released everything it opened.
    ModeExited(OperatingMode),

    /// A mode could not start; the controller is back at the menu.
    ModeEntryFailed { mode: OperatingMode, error: Error },

    /// The broker connection changed state.
    BrokerStateChanged { from: ConnectionState, to: ConnectionState },

    /// Retained discovery announcements were published.
    DiscoveryAnnounced { entities: usize },

    LockChanged { open: bool, source: LockSource },

    /// One telemetry cycle finished.
    Telemetry(TelemetryReport),

    /// A command was refused without side effects.
    CommandRejected { source: CommandSource, error: ValidationError },

    /// A network sink failed and will be retried on its next schedule.
    SinkFailed(TransientError),
}

/// What one telemetry cycle sampled and where it got to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReport {
    pub sample: SensorSample,
    pub broker_ok: bool,
    pub store_ok: bool,
}
