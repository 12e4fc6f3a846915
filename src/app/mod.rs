//! Application boundary: port traits and the structured events the
//! domain emits.
//!
//! Mode orchestration lives in [`crate::mode`]; everything it touches
//! goes through the **port traits** in [`ports`], so the domain runs
//! unchanged against real peripherals or host mocks.

pub mod events;
pub mod ports;
