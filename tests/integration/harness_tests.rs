//! Test mode: potentiometer menu and the self-test step machines.

use orion::app::events::{AppEvent, LockSource};
use orion::error::HardwareReadInvalid;
use orion::harness::{HarnessState, MenuItem, TestRun};
use orion::mode::{InputEvent, OperatingMode};
use orion::pins;
use orion::sensors::GpsFix;

use crate::mock_hw::Rig;

fn test_mode() -> Rig {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Test).unwrap();
    rig
}

fn harness_state(rig: &Rig) -> HarnessState {
    rig.ctl.harness().unwrap().state()
}

/// Park the pot and let the filter settle.
fn select(rig: &mut Rig, raw: u16, expected: MenuItem) {
    rig.hw.adc.insert(pins::POT_ADC_GPIO, raw);
    rig.run_for(1_000, 10);
    assert_eq!(rig.ctl.harness().unwrap().selected(), expected);
}

#[test]
fn entry_draws_menu_on_first_item() {
    let rig = test_mode();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Test));
    assert_eq!(rig.hw.adc_config.get(&pins::POT_ADC_GPIO), Some(&12));
    assert_eq!(rig.hw.shown_line(0), "-> Test Relays");
    assert_eq!(rig.hw.shown_line(5), "   Back");
    assert!(!rig.hw.gps_open);
    assert!(rig.hw.servos.iter().all(|s| !s.attached));
}

#[test]
fn pot_moves_the_cursor() {
    let mut rig = test_mode();
    select(&mut rig, 1_700, MenuItem::Climate);
    assert_eq!(rig.hw.shown_line(2), "-> Test DHT");
    select(&mut rig, 4_095, MenuItem::Back);
    assert_eq!(rig.hw.shown_line(5), "-> Back");
}

#[test]
fn relay_sweep_runs_each_relay_in_order() {
    let mut rig = test_mode();
    rig.input(InputEvent::Confirm).unwrap();
    assert!(rig.hw.relay_level(1));

    rig.run_for(2_800, 10);
    assert!(matches!(harness_state(&rig), HarnessState::Running(TestRun::Finished { .. })));
    assert_eq!(rig.hw.shown_line(6), "Done.");

    let relay_writes: Vec<_> = rig
        .hw
        .writes
        .iter()
        .filter(|(p, _)| pins::RELAY_GPIOS.contains(p))
        .copied()
        .collect();
    let expected: Vec<_> = pins::RELAY_GPIOS.iter().flat_map(|p| [(*p, true), (*p, false)]).collect();
    assert_eq!(relay_writes, expected);

    rig.run_for(1_000, 10);
    assert_eq!(harness_state(&rig), HarnessState::Menu);
    assert_eq!(rig.hw.shown_line(0), "-> Test Relays");
}

#[test]
fn lock_test_counts_down_and_timer_closes() {
    let mut rig = test_mode();
    select(&mut rig, 1_000, MenuItem::Lock);
    rig.input(InputEvent::Confirm).unwrap();
    assert!(rig.hw.lock_level());
    assert_eq!(rig.hw.shown_line(3), "3");
    assert!(rig.sink.contains(&AppEvent::LockChanged { open: true, source: LockSource::SelfTest }));

    rig.run_for(1_000, 10);
    assert_eq!(rig.hw.shown_line(3), "2");
    rig.run_for(1_000, 10);
    assert_eq!(rig.hw.shown_line(3), "1");
    rig.run_for(1_100, 10);

    assert!(!rig.hw.lock_level());
    assert_eq!(rig.hw.shown_line(4), "Closed.");
    assert!(rig.sink.contains(&AppEvent::LockChanged { open: false, source: LockSource::SafetyTimer }));
    assert_eq!(rig.hw.history(pins::LOCK_GPIO), [true, false]);
}

#[test]
fn climate_test_shows_result_until_confirm() {
    let mut rig = test_mode();
    select(&mut rig, 1_700, MenuItem::Climate);
    rig.input(InputEvent::Confirm).unwrap();
    assert_eq!(rig.hw.shown_line(1), "Reading...");
    let reads = rig.hw.climate_reads;

    rig.run_for(1_000, 10);
    assert_eq!(rig.hw.climate_reads, reads + 1);
    assert_eq!(rig.hw.shown_line(2), "Temp: 22 C");
    assert_eq!(rig.hw.shown_line(3), "Hum:  41 %");
    assert_eq!(harness_state(&rig), HarnessState::Running(TestRun::ClimateResult));

    // Stays up until the operator confirms.
    rig.run_for(5_000, 100);
    assert_eq!(harness_state(&rig), HarnessState::Running(TestRun::ClimateResult));
    rig.input(InputEvent::Confirm).unwrap();
    assert_eq!(rig.hw.shown_line(6), "Done.");
    rig.run_for(1_000, 10);
    assert_eq!(harness_state(&rig), HarnessState::Menu);
}

#[test]
fn climate_test_reports_sensor_error() {
    let mut rig = test_mode();
    rig.hw.climate = Err(HardwareReadInvalid::ClimateStatus(253));
    select(&mut rig, 1_700, MenuItem::Climate);
    rig.input(InputEvent::Confirm).unwrap();
    rig.run_for(1_000, 10);
    assert_eq!(rig.hw.shown_line(2), "Sensor error!");
    assert_eq!(rig.hw.shown_line(3), "climate status 253");
}

#[test]
fn gps_test_opens_feed_and_closes_on_confirm() {
    let mut rig = test_mode();
    select(&mut rig, 2_400, MenuItem::Gps);
    rig.input(InputEvent::Confirm).unwrap();
    assert!(rig.hw.gps_open);

    rig.tick();
    assert_eq!(rig.hw.shown_line(2), "Sats: 0");
    assert_eq!(rig.hw.shown_line(3), "Pos: no fix");

    rig.hw.gps_fix = Some(GpsFix { lat: 19.4326, lon: -99.1332, alt_m: 2240.0, satellites: 7 });
    rig.run_for(500, 10);
    assert_eq!(rig.hw.shown_line(2), "Sats: 7");
    assert_eq!(rig.hw.shown_line(3), "Lat: 19.43260");
    assert!(rig.hw.gps_pumped > 0);

    rig.input(InputEvent::Confirm).unwrap();
    assert!(!rig.hw.gps_open);
}

#[test]
fn servo_sweep_detaches_when_done() {
    let mut rig = test_mode();
    select(&mut rig, 3_000, MenuItem::Servos);
    rig.input(InputEvent::Confirm).unwrap();
    assert!(rig.hw.servos.iter().all(|s| s.attached && s.angle == Some(0)));

    rig.run_for(1_000, 10);
    assert!(rig.hw.servos.iter().all(|s| s.angle == Some(90)));
    rig.run_for(1_000, 10);
    assert!(rig.hw.servos.iter().all(|s| s.angle == Some(180)));
    rig.run_for(1_000, 10);
    assert!(rig.hw.servos.iter().all(|s| !s.attached));
}

#[test]
fn back_aborts_a_running_test() {
    let mut rig = test_mode();
    select(&mut rig, 3_000, MenuItem::Servos);
    rig.input(InputEvent::Confirm).unwrap();
    rig.input(InputEvent::Back).unwrap();
    assert_eq!(harness_state(&rig), HarnessState::Menu);
    assert!(rig.hw.servos.iter().all(|s| !s.attached));
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Test));
}

#[test]
fn back_during_relay_sweep_switches_every_relay_off() {
    let mut rig = test_mode();
    rig.input(InputEvent::Confirm).unwrap();
    rig.run_for(800, 10);
    assert!(rig.hw.relay_level(2));
    rig.input(InputEvent::Back).unwrap();
    assert_eq!(harness_state(&rig), HarnessState::Menu);
    assert!((1..=4).all(|n| !rig.hw.relay_level(n)));
    assert!(rig.ctl.devices().actuators.relays().iter().all(|r| !r.on));
}

#[test]
fn back_during_lock_test_closes_the_lock() {
    let mut rig = test_mode();
    select(&mut rig, 1_000, MenuItem::Lock);
    rig.input(InputEvent::Confirm).unwrap();
    rig.input(InputEvent::Back).unwrap();
    assert!(!rig.hw.lock_level());
    assert!(!rig.ctl.devices().lock_timer.is_armed());
}

#[test]
fn back_in_harness_menu_leaves_test_mode() {
    let mut rig = test_mode();
    rig.input(InputEvent::Back).unwrap();
    assert_eq!(rig.ctl.active_mode(), None);
    assert!(rig.sink.contains(&AppEvent::ModeExited(OperatingMode::Test)));
    assert!(!rig.hw.any_actuator_claimed());
}

#[test]
fn back_item_leaves_test_mode() {
    let mut rig = test_mode();
    select(&mut rig, 4_095, MenuItem::Back);
    rig.input(InputEvent::Confirm).unwrap();
    assert_eq!(rig.ctl.active_mode(), None);
}

#[test]
fn leaving_mid_test_closes_gps() {
    let mut rig = test_mode();
    select(&mut rig, 2_400, MenuItem::Gps);
    rig.input(InputEvent::Confirm).unwrap();
    rig.exit();
    assert!(!rig.hw.gps_open);
    assert_eq!(rig.ctl.active_mode(), None);
}
