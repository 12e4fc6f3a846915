//! Lock safety timer.
//!
//! Every unlock, whether it comes from the local console or the broker,
//! arms a single monotonic deadline. The controller ticks the timer on
//! every loop iteration regardless of mode, so the strike can never stay
//! energised longer than the hold without a fresh unlock.
//!
//! ## Lifecycle
//!
//! 1. `unlock(now)` drives the lock open, arms, records `started_at`.
//! 2. `tick(now)` relocks once `now - started_at >= hold` and reports it.
//! 3. `lock()` drives the lock closed and disarms right away.
//!
//! Re-unlocking while armed restarts the hold from the new `now`.

use log::info;

use crate::actuators::ActuatorState;
use crate::app::ports::PinPort;
use crate::config::SystemConfig;

/// Outcome of a [`LockSafetyTimer::tick`] that changed the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTimerEvent {
    /// Hold expired; the lock was driven closed.
    Relocked,
}

#[derive(Debug, Clone)]
pub struct LockSafetyTimer {
    hold_ms: u32,
    armed: bool,
    started_at_ms: u64,
}

impl LockSafetyTimer {
    pub fn new(hold_ms: u32) -> Self {
        Self {
            hold_ms,
            armed: false,
            started_at_ms: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.lock_hold_ms)
    }

    /// Open the lock and start the hold.
    pub fn unlock(&mut self, now_ms: u64, actuators: &mut ActuatorState, hw: &mut impl PinPort) {
        actuators.request_lock(hw, true);
        self.armed = true;
        self.started_at_ms = now_ms;
        info!("Lock: unlocked, relock in {} ms", self.hold_ms);
    }

    /// Close the lock now and cancel any pending relock.
    pub fn lock(&mut self, actuators: &mut ActuatorState, hw: &mut impl PinPort) {
        actuators.request_lock(hw, false);
        self.armed = false;
    }

    /// Drop the deadline without touching the pin.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Relock if the hold has elapsed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        actuators: &mut ActuatorState,
        hw: &mut impl PinPort,
    ) -> Option<LockTimerEvent> {
        if !self.armed || now_ms.saturating_sub(self.started_at_ms) < u64::from(self.hold_ms) {
            return None;
        }
        actuators.drive_lock(hw, false);
        self.armed = false;
        info!("Lock: hold expired, relocked");
        Some(LockTimerEvent::Relocked)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Relock deadline, meaningful only while armed.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.armed
            .then(|| self.started_at_ms + u64::from(self.hold_ms))
    }

    pub fn hold_ms(&self) -> u32 {
        self.hold_ms
    }
}
