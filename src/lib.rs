//! Orion home-automation firmware library.
//!
//! Exposes the mode controller, console interpreter, cloud logic and
//! drivers for integration testing. All ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod actuators;
pub mod app;
pub mod cloud;
pub mod config;
pub mod console;
pub mod error;
pub mod harness;
pub mod local;
pub mod mode;
pub mod pins;
pub mod safety;

// Hardware-facing layers; the raw calls inside are cfg-gated, so these
// build on the host with simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
