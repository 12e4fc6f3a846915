//! Local command interpreter.
//!
//! Turns one console line into actuator writes, sensor reads and
//! human-readable replies. Every rejected line gets an `Error:` reply and
//! leaves all state untouched.
//!
//! | Category | Actions                                         |
//! |----------|-------------------------------------------------|
//! | `relay`  | `set <1-4> <on/off>`, `get <1-4>`               |
//! | `lock`   | `open`, `set <on/off>`                          |
//! | `servo`  | `set <1-3> <0-180>`                             |
//! | `sensor` | `dht`, `ldr`, `gps`, `all`                      |
//! | `sys`    | `info`, `reset`                                 |
//! | `help`   | also `?`                                        |

pub mod command;

use log::info;

use crate::actuators::ActuatorState;
use crate::app::events::{AppEvent, LockSource};
use crate::app::ports::{Board, EventSink, ReplySink};
use crate::error::{HardwareReadInvalid, ValidationError};
use crate::safety::{LockSafetyTimer, LockTimerEvent};
use crate::sensors::light::LightSensor;
pub use command::Command;
use command::{parse_angle, parse_index, parse_level};

pub const SERVO_COUNT: usize = 3;

const HELP: &[&str] = &[
    "--- COMMANDS ---",
    "ACTUATORS:",
    "switch relay --> relay set <1-4> on/off",
    "read relay --> relay get <1-4>",
    "open lock --> lock open (open for 3 s)",
    "manual lock --> lock set on/off",
    "move servo --> servo set <1-3> <0-180>",
    "------",
    "SENSORS:",
    "read all --> sensor all",
    "read GPS --> sensor gps",
    "read DHT --> sensor dht",
    "read light --> sensor ldr",
    "SYSTEM:",
    "hardware info --> sys info",
    "restart --> sys reset",
];

/// Single-reading sensor queries. `sensor all` is this list in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorQuery {
    Dht,
    Ldr,
    Gps,
}

impl SensorQuery {
    pub const ALL: [Self; 3] = [Self::Dht, Self::Ldr, Self::Gps];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "dht" => Some(Self::Dht),
            "ldr" => Some(Self::Ldr),
            "gps" => Some(Self::Gps),
            _ => None,
        }
    }
}

/// Stateless apart from the reset flush delay.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    reset_delay_ms: u32,
}

impl CommandInterpreter {
    pub fn new(reset_delay_ms: u32) -> Self {
        Self { reset_delay_ms }
    }

    /// Interpret one line. Replies go to `out` and lock changes to
    /// `events`; a rejection is also returned so the caller can record it.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        line: &str,
        hw: &mut impl Board,
        actuators: &mut ActuatorState,
        lock_timer: &mut LockSafetyTimer,
        light: &LightSensor,
        out: &mut impl ReplySink,
        events: &mut impl EventSink,
    ) -> Result<(), ValidationError> {
        let cmd = Command::parse(line);
        let result = match cmd.category {
            "relay" => self.relay(&cmd, hw, actuators, out),
            "lock" => self.lock(&cmd, hw, actuators, lock_timer, out, events),
            "servo" => self.servo(&cmd, hw, out),
            "sensor" => self.sensor(&cmd, hw, light, out),
            "sys" => self.sys(&cmd, hw, out),
            "help" | "?" => {
                HELP.iter().for_each(|l| out.reply(l));
                Ok(())
            }
            _ => Err(ValidationError::UnknownCategory),
        };
        if let Err(e) = result {
            match e {
                ValidationError::UnknownCategory => {
                    out.reply("Unrecognized command. Try: 'help' or '?'");
                }
                other => out.reply(&format!("Error: {other}")),
            }
        }
        result
    }

    // ── relay ─────────────────────────────────────────────────

    fn relay(
        &self,
        cmd: &Command<'_>,
        hw: &mut impl Board,
        actuators: &mut ActuatorState,
        out: &mut impl ReplySink,
    ) -> Result<(), ValidationError> {
        let n = parse_index(cmd.target, crate::actuators::RELAY_COUNT)
            .ok_or(ValidationError::UnknownRelay)?
            + 1;
        match cmd.action {
            "set" => {
                let on = parse_level(cmd.value).ok_or(ValidationError::InvalidLevel)?;
                actuators.set_relay(hw, n, on)?;
                out.reply(&format!("OK: Relay {n} {}", on_off(on)));
                Ok(())
            }
            "get" => {
                let on = actuators.relay(n)?;
                out.reply(&format!("Info: Relay {n} is {}", on_off(on)));
                Ok(())
            }
            _ => Err(ValidationError::UnknownAction),
        }
    }

    // ── lock ──────────────────────────────────────────────────

    fn lock(
        &self,
        cmd: &Command<'_>,
        hw: &mut impl Board,
        actuators: &mut ActuatorState,
        lock_timer: &mut LockSafetyTimer,
        out: &mut impl ReplySink,
        events: &mut impl EventSink,
    ) -> Result<(), ValidationError> {
        match cmd.action {
            "open" => {
                let hold = lock_timer.hold_ms();
                out.reply(&format!("Opening lock for {} s...", hold / 1000));
                lock_timer.unlock(hw.now_ms(), actuators, hw);
                events.emit(&AppEvent::LockChanged { open: true, source: LockSource::Console });
                // Intentional blocking hold; the safety timer does the relock.
                hw.delay_ms(hold);
                while lock_timer.is_armed() {
                    match lock_timer.tick(hw.now_ms(), actuators, hw) {
                        Some(LockTimerEvent::Relocked) => {
                            events.emit(&AppEvent::LockChanged { open: false, source: LockSource::SafetyTimer });
                        }
                        None => hw.delay_ms(1),
                    }
                }
                out.reply("Lock closed.");
                Ok(())
            }
            "set" => {
                let open = parse_level(cmd.target).ok_or(ValidationError::InvalidLevel)?;
                if open {
                    lock_timer.unlock(hw.now_ms(), actuators, hw);
                } else {
                    lock_timer.lock(actuators, hw);
                }
                events.emit(&AppEvent::LockChanged { open, source: LockSource::Console });
                out.reply(&format!("OK: Lock {}", on_off(open)));
                Ok(())
            }
            _ => Err(ValidationError::UnknownAction),
        }
    }

    // ── servo ─────────────────────────────────────────────────

    fn servo(&self, cmd: &Command<'_>, hw: &mut impl Board, out: &mut impl ReplySink) -> Result<(), ValidationError> {
        if cmd.action != "set" {
            return Err(ValidationError::UnknownAction);
        }
        let index = parse_index(cmd.target, SERVO_COUNT).ok_or(ValidationError::UnknownServo)?;
        let angle = parse_angle(cmd.value).ok_or(ValidationError::InvalidAngle)?;
        hw.write_servo(index, angle);
        out.reply(&format!("Servo {} -> {angle}", index + 1));
        Ok(())
    }

    // ── sensor ────────────────────────────────────────────────

    fn sensor(
        &self,
        cmd: &Command<'_>,
        hw: &mut impl Board,
        light: &LightSensor,
        out: &mut impl ReplySink,
    ) -> Result<(), ValidationError> {
        if cmd.action == "all" {
            for query in SensorQuery::ALL {
                report_sensor(query, hw, light, out);
            }
            return Ok(());
        }
        let query = SensorQuery::from_token(cmd.action).ok_or(ValidationError::UnknownAction)?;
        report_sensor(query, hw, light, out);
        Ok(())
    }

    // ── sys ───────────────────────────────────────────────────

    fn sys(&self, cmd: &Command<'_>, hw: &mut impl Board, out: &mut impl ReplySink) -> Result<(), ValidationError> {
        match cmd.action {
            "info" => {
                out.reply("--- SYSTEM INFO ---");
                match hw.ip_address() {
                    Some(ip) => out.reply(&format!("IP: {ip}")),
                    None => out.reply("IP: not connected"),
                }
                match hw.rssi_dbm() {
                    Some(rssi) => out.reply(&format!("RSSI: {rssi} dBm")),
                    None => out.reply("RSSI: n/a"),
                }
                out.reply(&format!("Uptime: {} s", hw.now_ms() / 1000));
                Ok(())
            }
            "reset" => {
                out.reply("Restarting...");
                info!("Console: restart requested");
                hw.delay_ms(self.reset_delay_ms);
                hw.restart();
                Ok(())
            }
            _ => Err(ValidationError::UnknownAction),
        }
    }
}

/// One sensor reply line.
pub fn report_sensor(query: SensorQuery, hw: &mut impl Board, light: &LightSensor, out: &mut impl ReplySink) {
    match query {
        SensorQuery::Dht => match hw.read_climate() {
            Ok(r) => out.reply(&format!("DHT: {}C, {}%", r.temperature_c, r.humidity_pct)),
            Err(HardwareReadInvalid::ClimateStatus(code)) => out.reply(&format!("DHT Error: {code}")),
            Err(e) => out.reply(&format!("DHT Error: {e}")),
        },
        SensorQuery::Ldr => {
            let raw = light.read_raw(hw);
            let pct = light.percent_from_raw(raw);
            out.reply(&format!("LDR: {pct}% (Raw: {raw})"));
        }
        SensorQuery::Gps => match hw.gps_fix() {
            Some(fix) => out.reply(&format!(
                "GPS: Lat={:.6} Lon={:.6} Alt={:.2} Sats={}",
                fix.lat, fix.lon, fix.alt_m, fix.satellites
            )),
            None => out.reply("GPS: searching for satellites... (antenna needs open sky)"),
        },
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
