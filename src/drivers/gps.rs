//! GPS receiver on UART2 feeding the NMEA decoder.
//!
//! The UART driver is created once at boot and kept for the lifetime of
//! the firmware; `begin`/`end` only gate whether bytes are consumed, so
//! modes can open and close the feed freely.
//!
//! - **`target_os = "espidf"`**: `esp_idf_hal::uart::UartDriver`, read
//!   without blocking.
//! - **`not(target_os = "espidf")`**: a byte queue that tests and the
//!   simulator push NMEA text into.

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

use log::info;

use super::nmea::NmeaDecoder;
use crate::sensors::GpsFix;

const READ_CHUNK: usize = 64;

pub struct GpsReceiver {
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
    decoder: NmeaDecoder,
    open: bool,
}

impl GpsReceiver {
    #[cfg(target_os = "espidf")]
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self {
            uart,
            decoder: NmeaDecoder::new(),
            open: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            decoder: NmeaDecoder::new(),
            open: false,
        }
    }

    /// Queue simulated receiver output.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn begin(&mut self, baud: u32) {
        #[cfg(target_os = "espidf")]
        {
            if let Err(e) = self.uart.change_baudrate(baud) {
                log::warn!("GPS: baud change failed ({e})");
            }
            let _ = self.uart.clear_rx();
        }
        #[cfg(not(target_os = "espidf"))]
        self.rx.clear();

        self.decoder.reset();
        self.open = true;
        info!("GPS: feed open at {} baud", baud);
    }

    pub fn end(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.decoder.reset();
        info!("GPS: feed closed");
    }

    /// Decode at most `max_bytes` pending bytes. Returns the count consumed.
    pub fn pump(&mut self, max_bytes: usize) -> usize {
        if !self.open {
            return 0;
        }
        let mut consumed = 0;
        let mut buf = [0u8; READ_CHUNK];
        while consumed < max_bytes {
            let want = (max_bytes - consumed).min(READ_CHUNK);
            let n = self.read_pending(&mut buf[..want]);
            if n == 0 {
                break;
            }
            self.decoder.push_all(&buf[..n]);
            consumed += n;
        }
        consumed
    }

    #[cfg(target_os = "espidf")]
    fn read_pending(&mut self, buf: &mut [u8]) -> usize {
        self.uart.read(buf, esp_idf_hal::delay::NON_BLOCK).unwrap_or(0)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_pending(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, b) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = b;
        }
        n
    }

    pub fn fix(&self) -> Option<GpsFix> {
        self.decoder.fix()
    }

    pub fn satellites(&self) -> u8 {
        self.decoder.satellites()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for GpsReceiver {
    fn default() -> Self {
        Self::new()
    }
}
