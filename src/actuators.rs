//! Relay bank and electronic lock.
//!
//! [`ActuatorState`] is the single record of what every output should be
//! and what it physically is. The mode controller owns it and lends it to
//! whichever mode is active; nothing else holds a copy.
//!
//! The lock keeps two flags apart: `requested_open` is the intent of the
//! last operator or broker command, `open` is the level on the pin. The
//! safety relock only touches the latter.

use crate::app::ports::PinPort;
use crate::error::ValidationError;
use crate::pins;

pub const RELAY_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChannel {
    pub pin: i32,
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockChannel {
    pub pin: i32,
    pub requested_open: bool,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorState {
    relays: [RelayChannel; RELAY_COUNT],
    lock: LockChannel,
    claimed: bool,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorState {
    pub fn new() -> Self {
        Self {
            relays: pins::RELAY_GPIOS.map(|pin| RelayChannel { pin, on: false }),
            lock: LockChannel {
                pin: pins::LOCK_GPIO,
                requested_open: false,
                open: false,
            },
            claimed: false,
        }
    }

    /// Configure every actuator pin as an output, all LOW.
    pub fn claim(&mut self, hw: &mut impl PinPort) {
        for pin in pins::ACTUATOR_GPIOS {
            hw.claim_output(pin);
        }
        for relay in &mut self.relays {
            relay.on = false;
        }
        self.lock.requested_open = false;
        self.lock.open = false;
        self.claimed = true;
    }

    /// Drive everything LOW, then hand the pins back.
    pub fn release(&mut self, hw: &mut impl PinPort) {
        if !self.claimed {
            return;
        }
        for relay in &mut self.relays {
            hw.write_pin(relay.pin, false);
            relay.on = false;
        }
        hw.write_pin(self.lock.pin, false);
        self.lock.requested_open = false;
        self.lock.open = false;
        for pin in pins::ACTUATOR_GPIOS {
            hw.release_pin(pin);
        }
        self.claimed = false;
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    // ── Relays ────────────────────────────────────────────────

    /// Switch relay `n` (1..=4).
    pub fn set_relay(&mut self, hw: &mut impl PinPort, n: usize, on: bool) -> Result<(), ValidationError> {
        let relay = self.relay_mut(n)?;
        relay.on = on;
        hw.write_pin(relay.pin, on);
        Ok(())
    }

    /// Switch every relay off.
    pub fn all_relays_off(&mut self, hw: &mut impl PinPort) {
        for relay in &mut self.relays {
            relay.on = false;
            hw.write_pin(relay.pin, false);
        }
    }

    /// Current level of relay `n` (1..=4).
    pub fn relay(&self, n: usize) -> Result<bool, ValidationError> {
        n.checked_sub(1)
            .and_then(|i| self.relays.get(i))
            .map(|r| r.on)
            .ok_or(ValidationError::UnknownRelay)
    }

    pub fn relays(&self) -> &[RelayChannel; RELAY_COUNT] {
        &self.relays
    }

    fn relay_mut(&mut self, n: usize) -> Result<&mut RelayChannel, ValidationError> {
        n.checked_sub(1)
            .and_then(|i| self.relays.get_mut(i))
            .ok_or(ValidationError::UnknownRelay)
    }

    // ── Lock ──────────────────────────────────────────────────

    /// Record the commanded lock intent and drive the pin to match.
    pub fn request_lock(&mut self, hw: &mut impl PinPort, open: bool) {
        self.lock.requested_open = open;
        self.drive_lock(hw, open);
    }

    /// Physical lock level only. The intent is left as the last command set it.
    pub fn drive_lock(&mut self, hw: &mut impl PinPort, open: bool) {
        self.lock.open = open;
        hw.write_pin(self.lock.pin, open);
    }

    pub fn lock(&self) -> &LockChannel {
        &self.lock
    }

    pub fn lock_open(&self) -> bool {
        self.lock.open
    }
}
