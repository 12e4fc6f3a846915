//! Cloud mode: broker bridge plus time-series telemetry.
//!
//! | Piece                   | Role                                         |
//! |-------------------------|----------------------------------------------|
//! | `connectivity`          | broker state machine, inbound commands       |
//! | `telemetry`             | periodic sampling to broker and store        |
//! | `discovery`             | retained Home Assistant entity configs       |
//! | `line_protocol`         | store point serialisation                    |
//! | `topics`                | topic names and matching                     |

pub mod connectivity;
pub mod discovery;
pub mod line_protocol;
pub mod telemetry;
pub mod topics;

use log::{info, warn};

use crate::app::events::{AppEvent, TelemetryReport};
use crate::app::ports::{Board, EventSink, Network};
use crate::config::SystemConfig;
use crate::error::Result;
use crate::mode::Devices;
use connectivity::ConnectivityManager;
use telemetry::TelemetryPublisher;

pub struct CloudSession {
    connectivity: ConnectivityManager,
    telemetry: TelemetryPublisher,
    timezone: String,
    ntp_servers: Vec<String>,
    gps_baud: u32,
    gps_bytes_per_tick: usize,
    ldr_resolution_bits: u8,
}

impl CloudSession {
    pub fn new(config: &SystemConfig, seed: u32) -> Self {
        Self {
            connectivity: ConnectivityManager::new(config, seed),
            telemetry: TelemetryPublisher::new(config),
            timezone: config.timezone.clone(),
            ntp_servers: config.ntp_servers.clone(),
            gps_baud: config.gps_baud,
            gps_bytes_per_tick: config.gps_bytes_per_tick,
            ldr_resolution_bits: config.ldr_resolution_bits,
        }
    }

    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    /// Bring up sensors, wall clock and the broker client. Time sync and
    /// store validation failures are warnings; the session still starts.
    pub fn enter(
        &mut self,
        hw: &mut impl Board,
        net: &mut impl Network,
        devices: &mut Devices,
        events: &mut impl EventSink,
    ) -> Result<()> {
        hw.clear();
        hw.print_line(0, "== CLOUD MODE ==");
        hw.print_line(1, "Syncing clock...");
        hw.flush();

        devices.light.configure(hw, self.ldr_resolution_bits);
        hw.gps_begin(self.gps_baud);

        if let Err(e) = net.sync_time(&self.timezone, &self.ntp_servers) {
            warn!("Cloud: {e}, timestamps follow the store clock");
            events.emit(&AppEvent::SinkFailed(e));
        }

        hw.print_line(2, "Checking store...");
        hw.flush();
        match net.store_validate() {
            Ok(()) => info!("Cloud: time-series store reachable"),
            Err(e) => {
                warn!("Cloud: {e}");
                events.emit(&AppEvent::SinkFailed(e));
                hw.print_line(3, "Store error!");
                hw.flush();
            }
        }

        self.connectivity.reset(hw.now_ms());
        self.telemetry.reset();
        Ok(())
    }

    pub fn tick(
        &mut self,
        hw: &mut impl Board,
        net: &mut impl Network,
        devices: &mut Devices,
        events: &mut impl EventSink,
    ) {
        hw.gps_pump(self.gps_bytes_per_tick);

        let now = hw.now_ms();
        self.connectivity
            .tick(now, hw, &mut devices.actuators, &mut devices.lock_timer, net, events);

        let connected = self.connectivity.is_connected();
        if let Some(report) = self.telemetry.tick(now, hw, &devices.light, connected, net, events) {
            self.show_status(hw, &report);
        }
    }

    /// The safety timer closed the lock; tell the hub.
    pub fn on_relocked(&mut self, net: &mut impl Network, events: &mut impl EventSink) {
        self.connectivity.publish_lock_state(false, net, events);
    }

    pub fn exit(&mut self, hw: &mut impl Board, net: &mut impl Network, events: &mut impl EventSink) {
        self.connectivity.shutdown(net, events);
        hw.gps_end();
    }

    fn show_status(&self, hw: &mut impl Board, report: &TelemetryReport) {
        let s = &report.sample;
        hw.clear();
        hw.print_line(0, "== CLOUD MODE ==");
        hw.print_line(1, if self.connectivity.is_connected() { "MQTT: ON" } else { "MQTT: OFF" });
        hw.print_line(2, if report.store_ok { "Store: sent" } else { "Store: error" });
        let climate = match (s.temperature_c, s.humidity_pct) {
            (Some(t), Some(h)) => format!("T:{t} H:{h}"),
            _ => "T:-- H:--".to_owned(),
        };
        hw.print_line(3, &climate);
        match &s.gps {
            Some(fix) => hw.print_line(4, &format!("GPS: OK Sats:{}", fix.satellites)),
            None => hw.print_line(4, "GPS: searching..."),
        }
        hw.flush();
    }
}
