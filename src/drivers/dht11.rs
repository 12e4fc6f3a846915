//! DHT11 single-wire temperature/humidity driver.
//!
//! Generic over `embedded-hal` 1.0 so the same code runs against an
//! ESP-IDF open-drain `PinDriver` on target and a scripted pin in tests.
//!
//! ## Protocol
//!
//! | Phase          | Line                                      |
//! |----------------|-------------------------------------------|
//! | Start          | host LOW ≥ 18 ms, then release            |
//! | Response       | sensor LOW 80 µs, HIGH 80 µs              |
//! | Bit (×40)      | LOW 50 µs, HIGH 26–28 µs = 0 / 70 µs = 1  |
//!
//! The 40 bits are humidity int, humidity dec, temperature int,
//! temperature dec and an 8-bit additive checksum.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::HardwareReadInvalid;
use crate::sensors::ClimateReading;

const START_LOW_MS: u32 = 18;
/// Longest any single line phase may last before the read is abandoned.
const PHASE_TIMEOUT_US: u32 = 100;
/// Sample point after a bit's rising edge; between the 0 and 1 widths.
const BIT_SAMPLE_US: u32 = 35;

/// Read failures, with the status codes operators see on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    Timeout,
    Checksum,
    Pin,
}

impl DhtError {
    pub fn code(self) -> i32 {
        match self {
            Self::Timeout => 253,
            Self::Checksum => 254,
            Self::Pin => 255,
        }
    }
}

impl From<DhtError> for HardwareReadInvalid {
    fn from(e: DhtError) -> Self {
        HardwareReadInvalid::ClimateStatus(e.code())
    }
}

/// Validate and decode one 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateReading, DhtError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(DhtError::Checksum);
    }
    let mut temperature_c = i32::from(frame[2]);
    // Some DHT11 revisions flag sub-zero readings in the decimal byte.
    if frame[3] & 0x80 != 0 {
        temperature_c = -temperature_c;
    }
    Ok(ClimateReading {
        temperature_c,
        humidity_pct: i32::from(frame[0]),
    })
}

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up; it idles released (HIGH).
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// One blocking read, roughly 23 ms.
    pub fn read(&mut self) -> Result<ClimateReading, DhtError> {
        self.pin.set_low().map_err(|_| DhtError::Pin)?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| DhtError::Pin)?;

        // Sensor response: LOW then HIGH, then the first bit's LOW.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for _ in 0..8 {
                self.wait_for(true)?;
                self.delay.delay_us(BIT_SAMPLE_US);
                let one = self.pin.is_high().map_err(|_| DhtError::Pin)?;
                *byte = (*byte << 1) | u8::from(one);
                if one {
                    self.wait_for(false)?;
                }
            }
        }
        decode_frame(frame)
    }

    /// Busy-wait until the line reaches `high`.
    fn wait_for(&mut self, high: bool) -> Result<(), DhtError> {
        for _ in 0..PHASE_TIMEOUT_US {
            if self.pin.is_high().map_err(|_| DhtError::Pin)? == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }
}
