//! Broker connection state machine and inbound command dispatch.
//!
//! ```text
//!  Disconnected ──attempt──▶ Connecting ──Connected──▶ Connected
//!       ▲                        │                        │
//!       └──── timeout / error ───┘◀──── Disconnected ─────┘
//! ```
//!
//! Attempts start only from `Disconnected`, at most one every retry
//! period. Subscriptions and discovery go out exactly once per transition
//! into `Connected`. Broker events are drained with a per-tick budget so a
//! flood of messages cannot starve the rest of the loop.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::discovery;
use super::topics::{self, CommandTopic};
use crate::actuators::ActuatorState;
use crate::app::events::{AppEvent, CommandSource, LockSource};
use crate::app::ports::{BrokerEvent, BrokerPort, EventSink, InboundMessage, PinPort};
use crate::config::SystemConfig;
use crate::error::{TransientError, ValidationError};
use crate::safety::LockSafetyTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct ConnectivityManager {
    state: ConnectionState,
    client_id_prefix: String,
    retry_ms: u32,
    connect_timeout_ms: u32,
    events_per_tick: usize,
    /// Earliest time the next attempt may start while `Disconnected`.
    next_attempt_ms: u64,
    attempt_started_ms: u64,
    /// xorshift32 state for client-id suffixes; never zero.
    id_seed: u32,
    attempts: u32,
    announcements: u32,
}

impl ConnectivityManager {
    pub fn new(config: &SystemConfig, seed: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            client_id_prefix: config.client_id_prefix.clone(),
            retry_ms: config.broker_retry_ms,
            connect_timeout_ms: config.broker_connect_timeout_ms,
            events_per_tick: config.broker_events_per_tick,
            next_attempt_ms: 0,
            attempt_started_ms: 0,
            id_seed: seed.max(1),
            attempts: 0,
            announcements: 0,
        }
    }

    /// Fresh session: disconnected, first attempt due immediately.
    pub fn reset(&mut self, now_ms: u64) {
        self.state = ConnectionState::Disconnected;
        self.next_attempt_ms = now_ms;
        self.attempts = 0;
        self.announcements = 0;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Connection attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Discovery announcements since the last reset.
    pub fn announcements(&self) -> u32 {
        self.announcements
    }

    /// `<prefix>-<hex>` with a fresh 16-bit suffix per call.
    pub fn next_client_id(&mut self) -> String {
        let mut x = self.id_seed;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.id_seed = x;
        format!("{}-{:x}", self.client_id_prefix, x & 0xffff)
    }

    /// Drain broker events, then advance the connection state machine.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl PinPort,
        actuators: &mut ActuatorState,
        lock_timer: &mut LockSafetyTimer,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) {
        for _ in 0..self.events_per_tick {
            let Some(event) = broker.broker_poll() else {
                break;
            };
            match event {
                BrokerEvent::Connected => self.on_connected(now_ms, broker, events),
                BrokerEvent::Disconnected => self.on_lost(now_ms, events),
                BrokerEvent::Message(msg) => {
                    if let Err(e) = self.handle_inbound(&msg, now_ms, hw, actuators, lock_timer, broker, events) {
                        warn!("Broker: rejected {} ({e})", msg.topic);
                        events.emit(&AppEvent::CommandRejected { source: CommandSource::Broker, error: e });
                    }
                }
            }
        }

        match self.state {
            ConnectionState::Disconnected if now_ms >= self.next_attempt_ms => {
                self.attempt(now_ms, broker, events);
            }
            ConnectionState::Connecting
                if now_ms.saturating_sub(self.attempt_started_ms) >= u64::from(self.connect_timeout_ms) =>
            {
                warn!("Broker: connect timed out after {} ms", self.connect_timeout_ms);
                broker.broker_disconnect();
                events.emit(&AppEvent::SinkFailed(TransientError::BrokerUnreachable));
                self.fail(now_ms, events);
            }
            _ => {}
        }
    }

    /// Close the session. Used on mode exit.
    pub fn shutdown(&mut self, broker: &mut impl BrokerPort, events: &mut impl EventSink) {
        if self.state != ConnectionState::Disconnected {
            broker.broker_disconnect();
            self.transition(ConnectionState::Disconnected, events);
        }
    }

    /// Publish the lock state if a session is up. Publish errors are logged.
    pub fn publish_lock_state(&self, open: bool, broker: &mut impl BrokerPort, events: &mut impl EventSink) {
        if !self.is_connected() {
            return;
        }
        let payload: &[u8] = if open { b"UNLOCKED" } else { b"LOCKED" };
        publish_logged(broker, topics::LOCK_STATE, payload, events);
    }

    // ── State transitions ─────────────────────────────────────

    fn attempt(&mut self, now_ms: u64, broker: &mut impl BrokerPort, events: &mut impl EventSink) {
        let client_id = self.next_client_id();
        self.attempts += 1;
        info!("Broker: connecting as {client_id} (attempt {})", self.attempts);
        match broker.broker_connect(&client_id) {
            Ok(()) => {
                self.attempt_started_ms = now_ms;
                self.transition(ConnectionState::Connecting, events);
            }
            Err(e) => {
                warn!("Broker: {e}, retry in {} ms", self.retry_ms);
                events.emit(&AppEvent::SinkFailed(e));
                self.next_attempt_ms = now_ms + u64::from(self.retry_ms);
            }
        }
    }

    fn on_connected(&mut self, now_ms: u64, broker: &mut impl BrokerPort, events: &mut impl EventSink) {
        if self.state == ConnectionState::Connected {
            return;
        }
        self.transition(ConnectionState::Connected, events);

        for topic in topics::subscriptions() {
            if let Err(e) = broker.subscribe(topic) {
                warn!("Broker: subscribe {topic} failed ({e})");
                events.emit(&AppEvent::SinkFailed(e));
                broker.broker_disconnect();
                self.fail(now_ms, events);
                return;
            }
        }

        match discovery::announce(broker) {
            Ok(entities) => {
                self.announcements += 1;
                info!("Broker: discovery announced ({entities} entities)");
                events.emit(&AppEvent::DiscoveryAnnounced { entities });
            }
            Err(e) => {
                warn!("Broker: discovery failed ({e})");
                events.emit(&AppEvent::SinkFailed(e));
            }
        }
    }

    fn on_lost(&mut self, now_ms: u64, events: &mut impl EventSink) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        warn!("Broker: connection lost");
        self.fail(now_ms, events);
    }

    fn fail(&mut self, now_ms: u64, events: &mut impl EventSink) {
        self.next_attempt_ms = now_ms + u64::from(self.retry_ms);
        self.transition(ConnectionState::Disconnected, events);
    }

    fn transition(&mut self, to: ConnectionState, events: &mut impl EventSink) {
        let from = self.state;
        if from != to {
            self.state = to;
            events.emit(&AppEvent::BrokerStateChanged { from, to });
        }
    }

    // ── Inbound commands ──────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn handle_inbound(
        &mut self,
        msg: &InboundMessage,
        now_ms: u64,
        hw: &mut impl PinPort,
        actuators: &mut ActuatorState,
        lock_timer: &mut LockSafetyTimer,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) -> Result<(), ValidationError> {
        let command = topics::match_command(&msg.topic).ok_or(ValidationError::UnknownTopic)?;
        let payload = core::str::from_utf8(&msg.payload)
            .map_err(|_| ValidationError::InvalidPayload)?
            .trim();
        info!("Broker: command [{}] {payload}", msg.topic);

        match command {
            CommandTopic::Relay(n) => {
                let on = match payload {
                    "ON" => true,
                    "OFF" => false,
                    _ => return Err(ValidationError::InvalidPayload),
                };
                actuators.set_relay(hw, n, on)?;
                let echo: &[u8] = if on { b"ON" } else { b"OFF" };
                publish_logged(broker, command.state_topic(), echo, events);
            }
            CommandTopic::Lock => {
                let open = match payload {
                    "UNLOCK" => true,
                    "LOCK" => false,
                    _ => return Err(ValidationError::InvalidPayload),
                };
                if open {
                    lock_timer.unlock(now_ms, actuators, hw);
                } else {
                    lock_timer.lock(actuators, hw);
                }
                events.emit(&AppEvent::LockChanged { open, source: LockSource::Broker });
                self.publish_lock_state(open, broker, events);
            }
        }
        Ok(())
    }
}

fn publish_logged(broker: &mut impl BrokerPort, topic: &str, payload: &[u8], events: &mut impl EventSink) {
    if let Err(e) = broker.publish(topic, payload, false) {
        warn!("Broker: publish {topic} failed ({e})");
        events.emit(&AppEvent::SinkFailed(e));
    }
}
