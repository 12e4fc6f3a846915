//! Peripheral drivers and raw hardware helpers.

pub mod button;
pub mod dht11;
pub mod gps;
pub mod hw_init;
pub mod nmea;
pub mod servo;
pub mod watchdog;
