//! Hardware adapter: bridges real peripherals to the board port traits.
//!
//! Owns the DHT11 driver, the three servo channels, the GPS receiver, the
//! status display and the monotonic clock, and exposes them through the
//! ports that make up [`Board`](crate::app::ports::Board). Relay/lock GPIO
//! and the ADC go through [`hw_init`](crate::drivers::hw_init). This is
//! the only module that touches actual hardware; on non-espidf targets
//! the raw helpers are simulation stubs, so the adapter still runs.

use std::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use super::display::LogDisplay;
use super::time::MonotonicClock;
use super::wifi;
use crate::app::ports::{
    AdcPort, ClimatePort, ClockPort, DisplayPort, GpsPort, PinPort, ServoPort, SystemPort,
};
use crate::drivers::dht11::Dht11;
use crate::drivers::gps::GpsReceiver;
use crate::drivers::hw_init;
use crate::drivers::servo::Servo;
use crate::error::HardwareReadInvalid;
use crate::sensors::{ClimateReading, GpsFix};

/// The DHT11 needs a second between reads; faster polls get the last value.
const CLIMATE_MIN_INTERVAL_MS: u64 = 1_000;

pub struct HardwareAdapter<P, D, S> {
    clock: MonotonicClock,
    dht: Dht11<P, D>,
    last_climate: Option<(u64, Result<ClimateReading, HardwareReadInvalid>)>,
    servos: [Servo<S>; 3],
    gps: GpsReceiver,
    display: LogDisplay,
    /// Output levels last written, bit per GPIO.
    levels: u64,
    restart_requested: bool,
}

impl<P, D, S> HardwareAdapter<P, D, S>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    S: SetDutyCycle,
{
    pub fn new(dht: Dht11<P, D>, servos: [Servo<S>; 3], gps: GpsReceiver) -> Self {
        Self {
            clock: MonotonicClock::new(),
            dht,
            last_climate: None,
            servos,
            gps,
            display: LogDisplay::new(),
            levels: 0,
            restart_requested: false,
        }
    }

    pub fn display(&self) -> &LogDisplay {
        &self.display
    }

    pub fn gps_mut(&mut self) -> &mut GpsReceiver {
        &mut self.gps
    }

    /// Host builds cannot reboot; the request is recorded instead.
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    fn set_level(&mut self, pin: i32, high: bool) {
        let bit = 1u64 << pin;
        if high {
            self.levels |= bit;
        } else {
            self.levels &= !bit;
        }
    }
}

// ── Clock ─────────────────────────────────────────────────────

impl<P, D, S> ClockPort for HardwareAdapter<P, D, S> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

// ── Digital outputs ───────────────────────────────────────────

impl<P, D, S> PinPort for HardwareAdapter<P, D, S>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    S: SetDutyCycle,
{
    fn claim_output(&mut self, pin: i32) {
        if let Err(e) = hw_init::gpio_claim_output(pin) {
            warn!("hw: {e}");
        }
        self.set_level(pin, false);
    }

    fn release_pin(&mut self, pin: i32) {
        hw_init::gpio_release(pin);
        self.set_level(pin, false);
    }

    fn write_pin(&mut self, pin: i32, high: bool) {
        hw_init::gpio_write(pin, high);
        self.set_level(pin, high);
    }

    fn read_pin(&self, pin: i32) -> bool {
        self.levels & (1u64 << pin) != 0
    }
}

// ── Analog inputs ─────────────────────────────────────────────

impl<P, D, S> AdcPort for HardwareAdapter<P, D, S> {
    fn configure_adc(&mut self, pin: i32, resolution_bits: u8) {
        if let Err(e) = hw_init::adc1_configure(pin, resolution_bits) {
            warn!("hw: {e}");
        }
    }

    fn read_adc(&mut self, pin: i32) -> u16 {
        hw_init::adc1_read(pin)
    }
}

// ── Sensors ───────────────────────────────────────────────────

impl<P, D, S> ClimatePort for HardwareAdapter<P, D, S>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_climate(&mut self) -> Result<ClimateReading, HardwareReadInvalid> {
        let now = self.clock.now_ms();
        if let Some((at, last)) = self.last_climate {
            if now.saturating_sub(at) < CLIMATE_MIN_INTERVAL_MS {
                return last;
            }
        }
        let result = self.dht.read().map_err(HardwareReadInvalid::from);
        self.last_climate = Some((now, result));
        result
    }
}

impl<P, D, S> GpsPort for HardwareAdapter<P, D, S> {
    fn gps_begin(&mut self, baud: u32) {
        self.gps.begin(baud);
    }

    fn gps_end(&mut self) {
        self.gps.end();
    }

    fn gps_pump(&mut self, max_bytes: usize) -> usize {
        self.gps.pump(max_bytes)
    }

    fn gps_fix(&self) -> Option<GpsFix> {
        self.gps.fix()
    }

    fn gps_satellites(&self) -> u8 {
        self.gps.satellites()
    }
}

// ── Servos ────────────────────────────────────────────────────

impl<P, D, S: SetDutyCycle> ServoPort for HardwareAdapter<P, D, S> {
    fn attach_servo(&mut self, index: usize) {
        if let Some(servo) = self.servos.get_mut(index) {
            if servo.attach().is_err() {
                warn!("hw: servo {} attach failed", index + 1);
            }
        }
    }

    fn write_servo(&mut self, index: usize, angle: u8) {
        if let Some(servo) = self.servos.get_mut(index) {
            if servo.write(angle).is_err() {
                warn!("hw: servo {} write failed", index + 1);
            }
        }
    }

    fn detach_servo(&mut self, index: usize) {
        if let Some(servo) = self.servos.get_mut(index) {
            if servo.detach().is_err() {
                warn!("hw: servo {} detach failed", index + 1);
            }
        }
    }
}

// ── System ────────────────────────────────────────────────────

impl<P, D, S> SystemPort for HardwareAdapter<P, D, S> {
    fn ip_address(&self) -> Option<Ipv4Addr> {
        wifi::station_ip()
    }

    fn rssi_dbm(&self) -> Option<i8> {
        wifi::station_rssi()
    }

    fn restart(&mut self) {
        info!("hw: restart requested");
        self.restart_requested = true;
        #[cfg(target_os = "espidf")]
        // SAFETY: esp_restart never returns.
        unsafe {
            esp_idf_svc::sys::esp_restart();
        }
    }
}

// ── Display ───────────────────────────────────────────────────

impl<P, D, S> DisplayPort for HardwareAdapter<P, D, S> {
    fn clear(&mut self) {
        self.display.clear();
    }

    fn print_line(&mut self, row: u8, text: &str) {
        self.display.print_line(row, text);
    }

    fn flush(&mut self) {
        self.display.flush();
    }
}
