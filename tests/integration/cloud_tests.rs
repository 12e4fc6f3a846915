//! Cloud mode: broker connection lifecycle, inbound commands, telemetry.

use orion::app::events::{AppEvent, CommandSource, LockSource};
use orion::app::ports::BrokerEvent;
use orion::cloud::connectivity::ConnectionState;
use orion::cloud::line_protocol::FieldValue;
use orion::cloud::topics;
use orion::error::{HardwareReadInvalid, TransientError, ValidationError};
use orion::mode::OperatingMode;
use orion::sensors::GpsFix;

use crate::mock_hw::Rig;

fn cloud() -> Rig {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Cloud).unwrap();
    rig
}

fn state(rig: &Rig) -> ConnectionState {
    rig.ctl.cloud().unwrap().connectivity().state()
}

/// Enter Cloud and complete the first broker handshake.
fn connected() -> Rig {
    let mut rig = cloud();
    rig.tick();
    rig.net.deliver(BrokerEvent::Connected);
    rig.hw.advance(10);
    rig.tick();
    assert_eq!(state(&rig), ConnectionState::Connected);
    rig
}

#[test]
fn entry_syncs_clock_and_probes_store() {
    let rig = cloud();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Cloud));
    assert_eq!(rig.net.syncs, ["CST6CDT,M4.1.0,M10.5.0"]);
    assert_eq!(rig.net.validations, 1);
    assert!(rig.hw.gps_open);
    assert_eq!(state(&rig), ConnectionState::Disconnected);
}

#[test]
fn sink_failures_at_entry_do_not_block_it() {
    let mut rig = Rig::new();
    rig.net.sync_fail = true;
    rig.net.validate_fail = true;
    rig.enter(OperatingMode::Cloud).unwrap();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Cloud));
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::TimeSyncFailed)));
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::StoreUnreachable)));
    assert_eq!(rig.hw.shown_line(3), "Store error!");
}

#[test]
fn single_outstanding_connection_attempt() {
    let mut rig = cloud();
    rig.tick();
    assert_eq!(rig.net.connects.len(), 1);
    assert!(rig.net.connects[0].starts_with("ESP32Orion-"));
    assert_eq!(state(&rig), ConnectionState::Connecting);

    rig.run_for(9_000, 100);
    assert_eq!(rig.net.connects.len(), 1);
    assert_eq!(state(&rig), ConnectionState::Connecting);
}

#[test]
fn connect_timeout_then_retry() {
    let mut rig = cloud();
    rig.tick();
    rig.run_for(10_000, 100);
    assert_eq!(state(&rig), ConnectionState::Disconnected);
    assert_eq!(rig.net.disconnects, 1);
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::BrokerUnreachable)));

    rig.run_for(1_900, 100);
    assert_eq!(rig.net.connects.len(), 1);
    rig.run_for(100, 100);
    assert_eq!(rig.net.connects.len(), 2);
    assert_ne!(rig.net.connects[0], rig.net.connects[1]);
}

#[test]
fn refused_connect_retries_every_two_seconds() {
    let mut rig = cloud();
    rig.net.connect_fail = true;
    rig.tick();
    assert_eq!(rig.net.connects.len(), 1);
    assert_eq!(state(&rig), ConnectionState::Disconnected);

    rig.run_for(1_990, 10);
    assert_eq!(rig.net.connects.len(), 1);
    rig.run_for(10, 10);
    assert_eq!(rig.net.connects.len(), 2);
    rig.run_for(2_000, 10);
    assert_eq!(rig.net.connects.len(), 3);
}

#[test]
fn subscriptions_and_discovery_once_per_connection() {
    let mut rig = connected();
    assert_eq!(
        rig.net.subscriptions,
        ["orion/relay1/set", "orion/relay2/set", "orion/relay3/set", "orion/relay4/set", "orion/lock/set"]
    );
    assert_eq!(rig.net.retained().len(), 9);
    assert!(rig.sink.contains(&AppEvent::DiscoveryAnnounced { entities: 9 }));
    assert!(rig
        .net
        .retained()
        .iter()
        .all(|p| p.topic.starts_with("homeassistant/") && p.topic.ends_with("/config")));

    // A duplicate connected notification changes nothing.
    rig.net.deliver(BrokerEvent::Connected);
    rig.tick();
    assert_eq!(rig.net.retained().len(), 9);
    assert_eq!(rig.net.subscriptions.len(), 5);

    // Reconnect announces again.
    rig.net.deliver(BrokerEvent::Disconnected);
    rig.tick();
    assert_eq!(state(&rig), ConnectionState::Disconnected);
    rig.run_for(2_000, 100);
    assert_eq!(state(&rig), ConnectionState::Connecting);
    rig.net.deliver(BrokerEvent::Connected);
    rig.tick();
    assert_eq!(rig.net.retained().len(), 18);
    assert_eq!(rig.net.subscriptions.len(), 10);
    assert_eq!(rig.ctl.cloud().unwrap().connectivity().announcements(), 2);
}

#[test]
fn failed_subscribe_drops_the_session() {
    let mut rig = cloud();
    rig.net.subscribe_fail = true;
    rig.tick();
    rig.net.deliver(BrokerEvent::Connected);
    rig.tick();
    assert_eq!(state(&rig), ConnectionState::Disconnected);
    assert!(rig.net.retained().is_empty());
    assert_eq!(rig.net.disconnects, 1);
}

#[test]
fn relay_command_switches_and_echoes() {
    let mut rig = connected();
    rig.net.deliver_message("orion/relay2/set", "ON");
    rig.tick();
    assert!(rig.hw.relay_level(2));
    let echoes = rig.net.published_to("orion/relay2/state");
    assert_eq!(echoes.len(), 1);
    assert_eq!(echoes[0].text(), "ON");
    assert!(!echoes[0].retain);

    rig.net.deliver_message("orion/relay2/set", "OFF");
    rig.tick();
    assert!(!rig.hw.relay_level(2));
    assert_eq!(rig.net.published_to("orion/relay2/state")[1].text(), "OFF");
}

#[test]
fn invalid_payload_is_rejected() {
    let mut rig = connected();
    rig.net.deliver_message("orion/relay1/set", "MAYBE");
    rig.net.deliver_message("orion/garage/set", "ON");
    rig.tick();
    assert!(!rig.hw.relay_level(1));
    assert!(rig.net.published_to("orion/relay1/state").is_empty());
    assert!(rig.sink.contains(&AppEvent::CommandRejected {
        source: CommandSource::Broker,
        error: ValidationError::InvalidPayload,
    }));
    assert!(rig.sink.contains(&AppEvent::CommandRejected {
        source: CommandSource::Broker,
        error: ValidationError::UnknownTopic,
    }));
}

#[test]
fn unlock_arms_and_lock_cancels() {
    let mut rig = connected();
    rig.net.deliver_message(topics::LOCK_SET, "UNLOCK");
    rig.tick();
    assert!(rig.hw.lock_level());
    assert!(rig.ctl.devices().lock_timer.is_armed());
    assert_eq!(rig.net.published_to(topics::LOCK_STATE)[0].text(), "UNLOCKED");

    rig.hw.advance(1_000);
    rig.net.deliver_message(topics::LOCK_SET, "LOCK");
    rig.tick();
    assert!(!rig.hw.lock_level());
    assert!(!rig.ctl.devices().lock_timer.is_armed());
    assert_eq!(rig.net.published_to(topics::LOCK_STATE)[1].text(), "LOCKED");
}

#[test]
fn relock_publishes_locked() {
    let mut rig = connected();
    rig.net.deliver_message(topics::LOCK_SET, "UNLOCK");
    rig.tick();
    rig.run_for(2_900, 100);
    assert!(rig.hw.lock_level());
    rig.run_for(100, 100);
    assert!(!rig.hw.lock_level());

    let states: Vec<_> = rig.net.published_to(topics::LOCK_STATE).iter().map(|p| p.text().to_owned()).collect();
    assert_eq!(states, ["UNLOCKED", "LOCKED"]);
    assert!(rig.sink.contains(&AppEvent::LockChanged { open: false, source: LockSource::SafetyTimer }));
}

#[test]
fn first_telemetry_cycle_is_immediate_then_periodic() {
    let mut rig = cloud();
    rig.tick();
    assert_eq!(rig.net.points.len(), 1);
    rig.run_for(4_900, 100);
    assert_eq!(rig.net.points.len(), 1);
    rig.run_for(100, 100);
    assert_eq!(rig.net.points.len(), 2);
}

#[test]
fn point_carries_tags_fields_and_timestamp() {
    let mut rig = cloud();
    rig.hw.gps_fix = Some(GpsFix { lat: 19.4326, lon: -99.1332, alt_m: 2240.0, satellites: 7 });
    rig.tick();
    let p = &rig.net.points[0];
    assert_eq!(p.measurement(), "estado_sistema");
    assert_eq!(p.tag("dispositivo"), Some("ESP32_Orion_V1"));
    assert_eq!(p.tag("ubicacion"), Some("Azure_Demo"));
    assert_eq!(p.field("temperatura"), Some(FieldValue::Int(22)));
    assert_eq!(p.field("humedad"), Some(FieldValue::Int(41)));
    assert_eq!(p.field("luz_porcentaje"), Some(FieldValue::Int(50)));
    assert_eq!(p.field("luz_raw"), Some(FieldValue::Int(2200)));
    assert_eq!(p.field("satelites"), Some(FieldValue::Int(7)));
    assert_eq!(p.timestamp(), Some(1_700_000_000));
}

#[test]
fn failed_climate_read_still_writes_a_point() {
    let mut rig = connected();
    rig.hw.climate = Err(HardwareReadInvalid::ClimateStatus(254));
    rig.run_for(5_000, 100);

    let p = rig.net.points.last().unwrap();
    assert_eq!(p.field("temperatura"), None);
    assert_eq!(p.field("humedad"), None);
    assert_eq!(p.field("luz_porcentaje"), Some(FieldValue::Int(50)));

    let body = rig.net.published_to(topics::SENSORS_STATE).last().unwrap().text().to_owned();
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(v["temperature"].is_null());
    assert!(v["humidity"].is_null());
    assert_eq!(v["illuminance"], 50);
}

#[test]
fn broker_offline_still_writes_store() {
    let mut rig = cloud();
    rig.net.connect_fail = true;
    rig.tick();
    assert_eq!(rig.net.points.len(), 1);
    assert!(rig.net.published_to(topics::SENSORS_STATE).is_empty());
    assert_eq!(rig.hw.shown_line(1), "MQTT: OFF");
    assert_eq!(rig.hw.shown_line(2), "Store: sent");
}

#[test]
fn store_failure_does_not_stop_broker_publish() {
    let mut rig = connected();
    rig.net.store_fail = true;
    rig.run_for(5_000, 100);
    assert!(!rig.net.published_to(topics::SENSORS_STATE).is_empty());
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::StoreWriteFailed)));
    assert_eq!(rig.hw.shown_line(2), "Store: error");
}

#[test]
fn publish_failure_does_not_stop_store_write() {
    let mut rig = connected();
    let before = rig.net.points.len();
    rig.net.publish_fail = true;
    rig.run_for(5_000, 100);
    assert_eq!(rig.net.points.len(), before + 1);
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::BrokerPublishFailed)));
}

#[test]
fn failed_gps_publish_still_sends_sensor_state() {
    let mut rig = connected();
    rig.hw.gps_fix = Some(GpsFix { lat: 1.5, lon: 2.5, alt_m: 3.0, satellites: 5 });
    rig.net.publish_fail_topics.push(topics::GPS_STATE.to_owned());
    let before = rig.net.published_to(topics::SENSORS_STATE).len();
    rig.sink.clear();

    rig.run_for(5_000, 100);
    assert_eq!(rig.net.published_to(topics::SENSORS_STATE).len(), before + 1);
    assert!(rig.net.published_to(topics::GPS_STATE).is_empty());
    assert!(rig.sink.contains(&AppEvent::SinkFailed(TransientError::BrokerPublishFailed)));

    let report = rig
        .sink
        .events
        .iter()
        .rev()
        .find_map(|e| match e {
            AppEvent::Telemetry(r) => Some(*r),
            _ => None,
        })
        .unwrap();
    assert!(!report.broker_ok);
    assert!(report.store_ok);
}

#[test]
fn gps_published_only_with_fix() {
    let mut rig = connected();
    assert!(rig.net.published_to(topics::GPS_STATE).is_empty());
    rig.hw.gps_fix = Some(GpsFix { lat: 1.5, lon: 2.5, alt_m: 3.0, satellites: 5 });
    rig.run_for(5_000, 100);
    let gps = rig.net.published_to(topics::GPS_STATE);
    assert_eq!(gps.len(), 1);
    let v: serde_json::Value = serde_json::from_slice(&gps[0].payload).unwrap();
    assert_eq!(v["latitude"], 1.5);
    assert_eq!(v["longitude"], 2.5);
    assert_eq!(v["gps_accuracy"], 10);
}

#[test]
fn exit_closes_broker_and_gps() {
    let mut rig = connected();
    rig.net.deliver_message(topics::LOCK_SET, "UNLOCK");
    rig.tick();
    rig.exit();
    assert_eq!(rig.ctl.active_mode(), None);
    assert!(rig.net.disconnects >= 1);
    assert!(!rig.hw.gps_open);
    assert!(!rig.hw.lock_level());
    assert!(!rig.ctl.devices().lock_timer.is_armed());
    assert!(!rig.hw.any_actuator_claimed());
}
