//! Light-dependent resistor on an ADC pin.
//!
//! Raw readings are the arithmetic mean of `smoothing` consecutive
//! conversions. The percentage maps the calibrated window linearly onto
//! 0..=100 and saturates outside it.

use crate::app::ports::AdcPort;

pub const DEFAULT_CAL_MIN: u16 = 300;
pub const DEFAULT_CAL_MAX: u16 = 4095;
pub const DEFAULT_RESOLUTION_BITS: u8 = 12;

#[derive(Debug, Clone)]
pub struct LightSensor {
    pin: i32,
    resolution_bits: u8,
    cal_min: u16,
    cal_max: u16,
    smoothing: u8,
}

impl LightSensor {
    pub fn new(pin: i32) -> Self {
        Self {
            pin,
            resolution_bits: DEFAULT_RESOLUTION_BITS,
            cal_min: DEFAULT_CAL_MIN,
            cal_max: DEFAULT_CAL_MAX,
            smoothing: 1,
        }
    }

    /// Configure the ADC pin width. Call once per mode entry.
    pub fn configure(&mut self, adc: &mut impl AdcPort, resolution_bits: u8) {
        self.resolution_bits = resolution_bits.clamp(1, 16);
        adc.configure_adc(self.pin, self.resolution_bits);
    }

    /// Largest code the configured resolution can produce.
    pub fn full_scale(&self) -> u16 {
        ((1u32 << self.resolution_bits) - 1) as u16
    }

    /// Mean of `smoothing` reads, each clamped to full scale.
    pub fn read_raw(&self, adc: &mut impl AdcPort) -> u16 {
        let full_scale = self.full_scale();
        let n = u32::from(self.smoothing);
        let acc: u32 = (0..n)
            .map(|_| u32::from(adc.read_adc(self.pin).min(full_scale)))
            .sum();
        (acc / n) as u16
    }

    pub fn read_percent(&self, adc: &mut impl AdcPort) -> u8 {
        self.percent_from_raw(self.read_raw(adc))
    }

    /// Pure mapping of a raw code onto the calibrated 0..=100 scale.
    pub fn percent_from_raw(&self, raw: u16) -> u8 {
        if self.cal_max == self.cal_min {
            return 0;
        }
        let span = f32::from(self.cal_max - self.cal_min);
        let x = ((f32::from(raw) - f32::from(self.cal_min)) / span).clamp(0.0, 1.0);
        (x * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Set the dark/bright endpoints. Reversed arguments are swapped.
    pub fn set_calibration(&mut self, min: u16, max: u16) {
        if min > max {
            self.cal_min = max;
            self.cal_max = min;
        } else {
            self.cal_min = min;
            self.cal_max = max;
        }
    }

    pub fn calibration(&self) -> (u16, u16) {
        (self.cal_min, self.cal_max)
    }

    /// Number of reads averaged per sample. Zero is treated as one.
    pub fn set_smoothing(&mut self, n: u8) {
        self.smoothing = n.max(1);
    }

    pub fn smoothing(&self) -> u8 {
        self.smoothing
    }
}
