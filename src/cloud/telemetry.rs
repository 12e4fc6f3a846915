//! Periodic telemetry to two independent sinks.
//!
//! Each cycle samples every sensor once, publishes the sensor (and, with a
//! fix, GPS) JSON to the broker, and writes one point to the time-series
//! store. A failure on one sink is logged and does not stop the other;
//! nothing is retried until the next cycle.

use log::{debug, info, warn};
use serde::Serialize;

use super::line_protocol::Point;
use super::topics;
use crate::app::events::{AppEvent, TelemetryReport};
use crate::app::ports::{AdcPort, BrokerPort, ClimatePort, EventSink, GpsPort, TimeSeriesPort, TimeSyncPort};
use crate::config::SystemConfig;
use crate::error::TransientError;
use crate::sensors::light::LightSensor;
use crate::sensors::{self, GpsFix, SensorSample};

/// Reported to the automation hub as a fixed horizontal accuracy.
pub const GPS_ACCURACY_M: u8 = 10;

/// Body of `orion/sensors/state`. Failed climate reads serialise as `null`.
#[derive(Debug, Serialize)]
struct SensorsMessage {
    temperature: Option<i32>,
    humidity: Option<i32>,
    illuminance: u8,
}

/// Body of `orion/gps/state`.
#[derive(Debug, Serialize)]
struct GpsMessage {
    latitude: f64,
    longitude: f64,
    gps_accuracy: u8,
}

pub fn sensors_payload(sample: &SensorSample) -> Result<Vec<u8>, TransientError> {
    serde_json::to_vec(&SensorsMessage {
        temperature: sample.temperature_c,
        humidity: sample.humidity_pct,
        illuminance: sample.light_pct,
    })
    .map_err(|_| TransientError::BrokerPublishFailed)
}

pub fn gps_payload(fix: &GpsFix) -> Result<Vec<u8>, TransientError> {
    serde_json::to_vec(&GpsMessage {
        latitude: fix.lat,
        longitude: fix.lon,
        gps_accuracy: GPS_ACCURACY_M,
    })
    .map_err(|_| TransientError::BrokerPublishFailed)
}

pub struct TelemetryPublisher {
    interval_ms: u32,
    last_cycle_ms: Option<u64>,
    /// Measurement and tags; fields are rebuilt every cycle.
    template: Point,
}

impl TelemetryPublisher {
    pub fn new(config: &SystemConfig) -> Self {
        let mut template = Point::new(&config.measurement);
        template.add_tag("dispositivo", &config.device_tag);
        template.add_tag("ubicacion", &config.location_tag);
        Self {
            interval_ms: config.telemetry_interval_ms,
            last_cycle_ms: None,
            template,
        }
    }

    /// Next tick runs a cycle.
    pub fn reset(&mut self) {
        self.last_cycle_ms = None;
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_cycle_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= u64::from(self.interval_ms))
    }

    /// Run one cycle if the period has elapsed since the last cycle started.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl AdcPort + ClimatePort + GpsPort),
        light: &LightSensor,
        broker_connected: bool,
        net: &mut (impl BrokerPort + TimeSeriesPort + TimeSyncPort),
        events: &mut impl EventSink,
    ) -> Option<TelemetryReport> {
        if !self.is_due(now_ms) {
            return None;
        }
        self.last_cycle_ms = Some(now_ms);

        let sample = sensors::sample(hw, light);

        let broker_ok = if broker_connected {
            self.publish_broker(&sample, net, events)
        } else {
            debug!("Telemetry: broker offline, skipping publish");
            false
        };

        let point = self.build_point(&sample, net.unix_time());
        let store_ok = match net.store_write(&point) {
            Ok(()) => {
                info!("Telemetry: store write ok");
                true
            }
            Err(e) => {
                warn!("Telemetry: store sink failed ({e})");
                events.emit(&AppEvent::SinkFailed(e));
                false
            }
        };

        let report = TelemetryReport { sample, broker_ok, store_ok };
        events.emit(&AppEvent::Telemetry(report));
        Some(report)
    }

    /// GPS (with a fix) and sensor state go out as separate messages; one
    /// failing does not hold back the other. True only if all went out.
    fn publish_broker(&self, sample: &SensorSample, broker: &mut impl BrokerPort, events: &mut impl EventSink) -> bool {
        let gps_ok = sample
            .gps
            .as_ref()
            .is_none_or(|fix| publish_state(broker, topics::GPS_STATE, gps_payload(fix), events));
        let sensors_ok = publish_state(broker, topics::SENSORS_STATE, sensors_payload(sample), events);
        gps_ok && sensors_ok
    }

    /// One store point. Climate fields only on a good read, position
    /// fields only with a fix.
    pub fn build_point(&self, sample: &SensorSample, unix_secs: Option<u64>) -> Point {
        let mut point = self.template.clone();
        point.clear_fields();
        if let (Some(t), Some(h)) = (sample.temperature_c, sample.humidity_pct) {
            point.add_int("temperatura", i64::from(t));
            point.add_int("humedad", i64::from(h));
        }
        point.add_int("luz_porcentaje", i64::from(sample.light_pct));
        point.add_int("luz_raw", i64::from(sample.light_raw));
        if let Some(fix) = &sample.gps {
            point.add_float("latitud", fix.lat);
            point.add_float("longitud", fix.lon);
            point.add_float("altitud", fix.alt_m);
            point.add_int("satelites", i64::from(fix.satellites));
        }
        if let Some(ts) = unix_secs {
            point.set_timestamp(ts);
        }
        point
    }
}

fn publish_state(
    broker: &mut impl BrokerPort,
    topic: &str,
    body: Result<Vec<u8>, TransientError>,
    events: &mut impl EventSink,
) -> bool {
    match body.and_then(|body| broker.publish(topic, &body, false)) {
        Ok(()) => true,
        Err(e) => {
            warn!("Telemetry: publish to {topic} failed ({e})");
            events.emit(&AppEvent::SinkFailed(e));
            false
        }
    }
}
