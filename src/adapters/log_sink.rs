//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! application event to the logger (UART on target, stderr on host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen since boot.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::ModeEntered(mode) => info!("MODE  | entered {}", mode.name()),
            AppEvent::ModeExited(mode) => info!("MODE  | left {}", mode.name()),
            AppEvent::ModeEntryFailed { mode, error } => {
                warn!("MODE  | {} failed to start: {}", mode.name(), error);
            }
            AppEvent::BrokerStateChanged { from, to } => {
                info!("BROKER| {:?} -> {:?}", from, to);
            }
            AppEvent::DiscoveryAnnounced { entities } => {
                info!("BROKER| discovery announced ({} entities)", entities);
            }
            AppEvent::LockChanged { open, source } => {
                info!("LOCK  | {} ({:?})", if *open { "OPEN" } else { "CLOSED" }, source);
            }
            AppEvent::Telemetry(t) => {
                let s = &t.sample;
                info!(
                    "TELEM | T={} H={} | light={}% ({}) | gps={} | broker={} store={}",
                    s.temperature_c.map_or_else(|| "--".to_owned(), |v| v.to_string()),
                    s.humidity_pct.map_or_else(|| "--".to_owned(), |v| v.to_string()),
                    s.light_pct,
                    s.light_raw,
                    s.gps.map_or_else(
                        || "searching".to_owned(),
                        |f| format!("{:.6},{:.6} ({} sats)", f.lat, f.lon, f.satellites)
                    ),
                    if t.broker_ok { "ok" } else { "skip" },
                    if t.store_ok { "ok" } else { "fail" },
                );
            }
            AppEvent::CommandRejected { source, error } => {
                warn!("CMD   | rejected from {:?}: {}", source, error);
            }
            AppEvent::SinkFailed(e) => warn!("SINK  | {}", e),
        }
    }
}
