//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ModeController (domain)
//! ```
//!
//! Driven adapters (pins, ADC, climate, GPS, servos, display, console,
//! broker, time-series store) implement these traits. The mode layer
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly.
//!
//! Two bundle traits group them: [`Board`] for everything on the PCB and
//! [`Network`] for everything behind the Wi-Fi link. Both have blanket
//! impls, so an adapter only implements the individual ports.

use std::net::Ipv4Addr;

use crate::cloud::line_protocol::Point;
use crate::error::{HardwareReadInvalid, TransientError};
use crate::sensors::{ClimateReading, GpsFix};

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus the one blocking wait the firmware uses.
pub trait ClockPort {
    /// Milliseconds since boot. Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block the loop for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Digital outputs
// ───────────────────────────────────────────────────────────────

pub trait PinPort {
    /// Configure `pin` as a push-pull output, driven LOW.
    fn claim_output(&mut self, pin: i32);

    /// Return `pin` to a floating input.
    fn release_pin(&mut self, pin: i32);

    fn write_pin(&mut self, pin: i32, high: bool);

    fn read_pin(&self, pin: i32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Analog inputs
// ───────────────────────────────────────────────────────────────

pub trait AdcPort {
    /// Set the sample width for `pin`.
    fn configure_adc(&mut self, pin: i32, resolution_bits: u8);

    /// One raw conversion.
    fn read_adc(&mut self, pin: i32) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Sensor collaborators
// ───────────────────────────────────────────────────────────────

/// Blocking temperature/humidity read.
pub trait ClimatePort {
    fn read_climate(&mut self) -> Result<ClimateReading, HardwareReadInvalid>;
}

/// Serial GPS feed with an NMEA decoder behind it.
pub trait GpsPort {
    fn gps_begin(&mut self, baud: u32);

    fn gps_end(&mut self);

    /// Feed at most `max_bytes` pending UART bytes to the decoder.
    /// Returns the number consumed.
    fn gps_pump(&mut self, max_bytes: usize) -> usize;

    /// Latest valid fix, `None` while searching.
    fn gps_fix(&self) -> Option<GpsFix>;

    /// Satellites in view, valid fix or not.
    fn gps_satellites(&self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Servos
// ───────────────────────────────────────────────────────────────

/// Servo indices are zero based here; the console speaks 1..=3.
pub trait ServoPort {
    fn attach_servo(&mut self, index: usize);

    /// `angle` is already clamped to 0..=180 by the caller.
    fn write_servo(&mut self, index: usize, angle: u8);

    fn detach_servo(&mut self, index: usize);
}

// ───────────────────────────────────────────────────────────────
// System
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Station address, `None` while not associated.
    fn ip_address(&self) -> Option<Ipv4Addr>;

    /// Signal strength of the current association in dBm.
    fn rssi_dbm(&self) -> Option<i8>;

    /// Reboot the chip. Does not return on hardware.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display
// ───────────────────────────────────────────────────────────────

/// Line-oriented status display.
pub trait DisplayPort {
    fn clear(&mut self);

    fn print_line(&mut self, row: u8, text: &str);

    /// Push the buffered frame to the panel.
    fn flush(&mut self);
}

/// Every on-board collaborator the modes drive.
pub trait Board:
    ClockPort + PinPort + AdcPort + ClimatePort + GpsPort + ServoPort + SystemPort + DisplayPort
{
}

impl<T> Board for T where
    T: ClockPort + PinPort + AdcPort + ClimatePort + GpsPort + ServoPort + SystemPort + DisplayPort
{
}

// ───────────────────────────────────────────────────────────────
// Local text console (driving adapter: operator → domain)
// ───────────────────────────────────────────────────────────────

pub trait ConsolePort {
    /// Open the console transport.
    fn console_start(&mut self) -> Result<(), TransientError>;

    fn console_stop(&mut self);

    /// Next complete line, without the terminator.
    fn console_poll_line(&mut self) -> Option<String>;

    fn console_write_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Pub/sub broker
// ───────────────────────────────────────────────────────────────

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Transport-level happenings, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Disconnected,
    Message(InboundMessage),
}

pub trait BrokerPort {
    /// Start a connection attempt. Completion arrives as
    /// [`BrokerEvent::Connected`] through [`BrokerPort::broker_poll`].
    fn broker_connect(&mut self, client_id: &str) -> Result<(), TransientError>;

    fn broker_disconnect(&mut self);

    /// Next queued event, if any. Never blocks.
    fn broker_poll(&mut self) -> Option<BrokerEvent>;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransientError>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), TransientError>;
}

// ───────────────────────────────────────────────────────────────
// Time-series store
// ───────────────────────────────────────────────────────────────

pub trait TimeSeriesPort {
    /// Reachability probe.
    fn store_validate(&mut self) -> Result<(), TransientError>;

    fn store_write(&mut self, point: &Point) -> Result<(), TransientError>;
}

// ───────────────────────────────────────────────────────────────
// Wall clock
// ───────────────────────────────────────────────────────────────

pub trait TimeSyncPort {
    /// Configure the timezone and start NTP against `servers`.
    fn sync_time(&mut self, timezone: &str, servers: &[String]) -> Result<(), TransientError>;

    /// Seconds since the Unix epoch, `None` until synchronised.
    fn unix_time(&self) -> Option<u64>;
}

// ───────────────────────────────────────────────────────────────
// Service advertisement (mDNS)
// ───────────────────────────────────────────────────────────────

/// One advertised service under `<hostname>.local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceAdvert<'a> {
    pub hostname: &'a str,
    pub instance: &'a str,
    /// e.g. `_telnet`
    pub service: &'a str,
    /// `_tcp` or `_udp`
    pub proto: &'a str,
    pub port: u16,
}

pub trait AdvertisePort {
    fn advertise_start(&mut self, advert: &ServiceAdvert<'_>) -> Result<(), TransientError>;

    fn advertise_stop(&mut self);
}

/// Everything reached over the network link.
pub trait Network: ConsolePort + BrokerPort + TimeSeriesPort + TimeSyncPort + AdvertisePort {}

impl<T> Network for T where T: ConsolePort + BrokerPort + TimeSeriesPort + TimeSyncPort + AdvertisePort {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Reply sink (command output channel)
// ───────────────────────────────────────────────────────────────

/// Where the command interpreter writes its human-readable replies.
pub trait ReplySink {
    fn reply(&mut self, line: &str);
}

impl ReplySink for Vec<String> {
    fn reply(&mut self, line: &str) {
        self.push(line.to_owned());
    }
}
