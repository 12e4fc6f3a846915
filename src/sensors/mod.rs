//! Sensor subsystem: value types and the sampler that builds a
//! [`SensorSample`] from the board's collaborators.
//!
//! Drivers are stateless services: nothing here owns a pin. Absent
//! readings stay `None` all the way to the sinks.

pub mod light;

use serde::Serialize;

use crate::app::ports::{AdcPort, ClimatePort, GpsPort};
use light::LightSensor;

/// One successful climate read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReading {
    pub temperature_c: i32,
    pub humidity_pct: i32,
}

/// A valid GPS position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
    pub alt_m: f64,
    pub satellites: u8,
}

/// Everything one telemetry cycle knows about the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub temperature_c: Option<i32>,
    pub humidity_pct: Option<i32>,
    /// Calibrated ambient light, 0..=100.
    pub light_pct: u8,
    pub light_raw: u16,
    pub gps: Option<GpsFix>,
}

/// Read every sensor once.
///
/// A failed climate read is logged and leaves both climate fields `None`;
/// it never aborts the sample.
pub fn sample(hw: &mut (impl AdcPort + ClimatePort + GpsPort), light: &LightSensor) -> SensorSample {
    let (temperature_c, humidity_pct) = match hw.read_climate() {
        Ok(r) => (Some(r.temperature_c), Some(r.humidity_pct)),
        Err(e) => {
            log::warn!("Climate read failed: {e}");
            (None, None)
        }
    };
    let light_raw = light.read_raw(hw);
    SensorSample {
        temperature_c,
        humidity_pct,
        light_pct: light.percent_from_raw(light_raw),
        light_raw,
        gps: hw.gps_fix(),
    }
}
