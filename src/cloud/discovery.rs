//! Home Assistant MQTT discovery announcements.
//!
//! Each entity gets one retained JSON config on its discovery topic. Keys
//! use the abbreviated discovery schema (`uniq_id`, `cmd_t`, `stat_t`...).

use serde::Serialize;

use super::topics::{self, discovery_topic};
use crate::app::ports::BrokerPort;
use crate::error::TransientError;

#[derive(Debug, Clone, Serialize)]
pub struct DeviceBlock {
    pub ids: &'static str,
    pub name: &'static str,
    pub mdl: &'static str,
    pub mf: &'static str,
}

pub const DEVICE: DeviceBlock = DeviceBlock {
    ids: "orion_esp32_v1",
    name: "Orion IoT System",
    mdl: "ESP32 Custom",
    mf: "Orion IoT",
};

/// One discovery config body.
#[derive(Debug, Clone, Serialize)]
pub struct EntityConfig {
    pub name: &'static str,
    pub uniq_id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_t: Option<&'static str>,
    pub stat_t: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl_off: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl_lock: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl_unlk: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_tpl: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_cla: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_meas: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attr_t: Option<&'static str>,
    pub dev: DeviceBlock,
}

impl EntityConfig {
    const fn base(name: &'static str, uniq_id: &'static str, stat_t: &'static str) -> Self {
        Self {
            name,
            uniq_id,
            cmd_t: None,
            stat_t,
            pl_on: None,
            pl_off: None,
            pl_lock: None,
            pl_unlk: None,
            val_tpl: None,
            dev_cla: None,
            unit_of_meas: None,
            json_attr_t: None,
            dev: DEVICE,
        }
    }
}

/// An entity and where its config is published.
#[derive(Debug, Clone)]
pub struct Entity {
    pub component: &'static str,
    pub config: EntityConfig,
}

const RELAY_NAMES: [&str; 4] = ["Kitchen Light", "Living Room Light", "Hallway Light", "Bedroom Light"];
const RELAY_IDS: [&str; 4] = ["relay1", "relay2", "relay3", "relay4"];

fn light(n: usize) -> Entity {
    let mut config = EntityConfig::base(RELAY_NAMES[n], RELAY_IDS[n], topics::RELAY_STATE[n]);
    config.cmd_t = Some(topics::RELAY_SET[n]);
    config.pl_on = Some("ON");
    config.pl_off = Some("OFF");
    Entity { component: "light", config }
}

fn sensor(name: &'static str, id: &'static str, template: &'static str, unit: &'static str) -> Entity {
    let mut config = EntityConfig::base(name, id, topics::SENSORS_STATE);
    config.val_tpl = Some(template);
    config.dev_cla = Some(id);
    config.unit_of_meas = Some(unit);
    Entity { component: "sensor", config }
}

/// Every announced entity, in publish order.
pub fn entities() -> Vec<Entity> {
    let mut all: Vec<Entity> = (0..RELAY_IDS.len()).map(light).collect();

    let mut lock = EntityConfig::base("Main Lock", "lock_main", topics::LOCK_STATE);
    lock.cmd_t = Some(topics::LOCK_SET);
    lock.pl_lock = Some("LOCK");
    lock.pl_unlk = Some("UNLOCK");
    all.push(Entity { component: "lock", config: lock });

    all.push(sensor("Temperature", "temperature", "{{ value_json.temperature }}", "°C"));
    all.push(sensor("Humidity", "humidity", "{{ value_json.humidity }}", "%"));
    all.push(sensor("Illuminance", "illuminance", "{{ value_json.illuminance }}", "%"));

    let mut tracker = EntityConfig::base("Orion GPS", "gps_tracker", topics::GPS_STATE);
    tracker.json_attr_t = Some(topics::GPS_STATE);
    all.push(Entity { component: "device_tracker", config: tracker });

    all
}

/// Publish every entity config, retained. Stops at the first broker
/// failure; the next connection announces again.
pub fn announce(broker: &mut impl BrokerPort) -> Result<usize, TransientError> {
    let entities = entities();
    for entity in &entities {
        let topic = discovery_topic(entity.component, entity.config.uniq_id)
            .map_err(|_| TransientError::BrokerPublishFailed)?;
        let body =
            serde_json::to_vec(&entity.config).map_err(|_| TransientError::BrokerPublishFailed)?;
        broker.publish(&topic, &body, true)?;
    }
    Ok(entities.len())
}
