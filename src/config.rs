//! System configuration parameters
//!
//! All tunable parameters for the Orion controller. Defaults match the
//! deployed board; a JSON override can be deserialised on top of them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mode::OperatingMode;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Broker ---
    pub broker_host: String,
    pub broker_port: u16,
    pub broker_user: String,
    pub broker_pass: String,
    /// Client id is `<prefix>-<hex suffix>`
    pub client_id_prefix: String,

    // --- Time-series store ---
    pub store_url: String,
    pub store_org: String,
    pub store_bucket: String,
    pub store_token: String,
    pub measurement: String,
    /// Value of the `dispositivo` tag
    pub device_tag: String,
    /// Value of the `ubicacion` tag
    pub location_tag: String,

    // --- Wall clock ---
    /// POSIX TZ string
    pub timezone: String,
    pub ntp_servers: Vec<String>,

    // --- Timing ---
    /// How long an unlock may hold before the safety relock (milliseconds)
    pub lock_hold_ms: u32,
    /// Fixed delay between broker connection attempts (milliseconds)
    pub broker_retry_ms: u32,
    /// A connection attempt older than this is abandoned (milliseconds)
    pub broker_connect_timeout_ms: u32,
    /// Telemetry cycle period (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Delay between the `sys reset` reply and the restart (milliseconds)
    pub reset_delay_ms: u32,
    /// Main loop pacing (milliseconds)
    pub tick_interval_ms: u32,

    // --- Light sensor ---
    pub ldr_cal_min: u16,
    pub ldr_cal_max: u16,
    pub ldr_resolution_bits: u8,
    pub ldr_smoothing: u8,

    // --- Per-tick budgets ---
    /// GPS bytes consumed per tick
    pub gps_bytes_per_tick: usize,
    pub gps_baud: u32,
    /// Broker events drained per tick
    pub broker_events_per_tick: usize,
    /// Console lines handled per tick
    pub console_lines_per_tick: usize,

    // --- Local console ---
    pub console_port: u16,
    /// Advertised as `<name>.local` while the console is up
    pub mdns_hostname: String,

    /// Mode entered after boot
    pub boot_mode: OperatingMode,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Broker
            broker_host: "192.168.1.10".into(),
            broker_port: 1883,
            broker_user: String::new(),
            broker_pass: String::new(),
            client_id_prefix: "ESP32Orion".into(),

            // Store
            store_url: "http://192.168.1.10:8086".into(),
            store_org: "orioniot".into(),
            store_bucket: "sensores".into(),
            store_token: String::new(),
            measurement: "estado_sistema".into(),
            device_tag: "ESP32_Orion_V1".into(),
            location_tag: "Azure_Demo".into(),

            // Wall clock
            timezone: "CST6CDT,M4.1.0,M10.5.0".into(),
            ntp_servers: vec!["pool.ntp.org".into(), "time.nis.gov".into()],

            // Timing
            lock_hold_ms: 3000,
            broker_retry_ms: 2000,
            broker_connect_timeout_ms: 10_000,
            telemetry_interval_ms: 5000,
            reset_delay_ms: 500,
            tick_interval_ms: 10,

            // Light sensor
            ldr_cal_min: 300,
            ldr_cal_max: 4095,
            ldr_resolution_bits: 12,
            ldr_smoothing: 1,

            // Budgets
            gps_bytes_per_tick: 256,
            gps_baud: 9600,
            broker_events_per_tick: 8,
            console_lines_per_tick: 4,

            console_port: 23,
            mdns_hostname: "orion-iot".into(),

            boot_mode: OperatingMode::Cloud,
        }
    }
}

impl SystemConfig {
    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_host"));
        }
        if self.lock_hold_ms == 0 {
            return Err(ConfigError::ValidationFailed("lock_hold_ms"));
        }
        if self.broker_retry_ms == 0 {
            return Err(ConfigError::ValidationFailed("broker_retry_ms"));
        }
        if self.broker_connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("broker_connect_timeout_ms"));
        }
        if self.telemetry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("telemetry_interval_ms"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms"));
        }
        if !(1..=16).contains(&self.ldr_resolution_bits) {
            return Err(ConfigError::ValidationFailed("ldr_resolution_bits"));
        }
        if self.mdns_hostname.is_empty()
            || !self.mdns_hostname.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(ConfigError::ValidationFailed("mdns_hostname"));
        }
        if self.gps_bytes_per_tick == 0
            || self.broker_events_per_tick == 0
            || self.console_lines_per_tick == 0
        {
            return Err(ConfigError::ValidationFailed("per-tick budget"));
        }
        Ok(())
    }
}
