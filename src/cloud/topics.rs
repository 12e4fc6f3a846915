//! Broker topic layout.
//!
//! Everything lives under `orion/`. Command topics end in `/set`, their
//! echoes in `/state`. Discovery configs go under `homeassistant/`.

use core::fmt::Write;

use heapless::String;

pub const RELAY_SET: [&str; 4] = [
    "orion/relay1/set",
    "orion/relay2/set",
    "orion/relay3/set",
    "orion/relay4/set",
];

pub const RELAY_STATE: [&str; 4] = [
    "orion/relay1/state",
    "orion/relay2/state",
    "orion/relay3/state",
    "orion/relay4/state",
];

pub const LOCK_SET: &str = "orion/lock/set";
pub const LOCK_STATE: &str = "orion/lock/state";
pub const SENSORS_STATE: &str = "orion/sensors/state";
pub const GPS_STATE: &str = "orion/gps/state";

pub const DISCOVERY_PREFIX: &str = "homeassistant";
pub const NODE_ID: &str = "orion";

/// Fixed-capacity topic buffer.
pub type Topic = String<96>;

/// Which command an inbound topic addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTopic {
    /// One-based relay number.
    Relay(usize),
    Lock,
}

impl CommandTopic {
    /// Where the applied state is echoed.
    pub fn state_topic(self) -> &'static str {
        match self {
            Self::Relay(n) => RELAY_STATE[n - 1],
            Self::Lock => LOCK_STATE,
        }
    }
}

/// Everything subscribed on each fresh connection, in order.
pub fn subscriptions() -> impl Iterator<Item = &'static str> {
    RELAY_SET.into_iter().chain(core::iter::once(LOCK_SET))
}

/// Match the last two path segments exactly, so a bridged prefix still
/// routes but `orion/unlock/set` does not.
pub fn match_command(topic: &str) -> Option<CommandTopic> {
    let mut segments = topic.rsplit('/');
    if segments.next() != Some("set") {
        return None;
    }
    let name = segments.next()?;
    if name == "lock" {
        return Some(CommandTopic::Lock);
    }
    (1..=RELAY_SET.len())
        .find(|&n| RELAY_SET[n - 1].split('/').nth(1) == Some(name))
        .map(CommandTopic::Relay)
}

/// `homeassistant/<component>/orion/<unique_id>/config`
pub fn discovery_topic(component: &str, unique_id: &str) -> Result<Topic, core::fmt::Error> {
    let mut topic = Topic::new();
    write!(topic, "{DISCOVERY_PREFIX}/{component}/{NODE_ID}/{unique_id}/config")?;
    Ok(topic)
}
