//! Mode controller: menu navigation, exclusive ownership, exit cleanup.

use orion::app::events::{AppEvent, LockSource};
use orion::config::SystemConfig;
use orion::mode::{InputEvent, OperatingMode};
use orion::pins;

use crate::mock_hw::Rig;

#[test]
fn boots_into_menu_with_configured_choice() {
    let rig = Rig::new();
    assert_eq!(rig.ctl.active_mode(), None);
    assert_eq!(rig.ctl.menu_choice(), OperatingMode::Cloud);
}

#[test]
fn back_cycles_menu_and_confirm_enters() {
    let mut rig = Rig::new();
    rig.input(InputEvent::Back).unwrap();
    assert_eq!(rig.ctl.menu_choice(), OperatingMode::Test);
    assert_eq!(rig.hw.shown_line(3), "-> Test mode");
    rig.input(InputEvent::Back).unwrap();
    assert_eq!(rig.ctl.menu_choice(), OperatingMode::Local);
    assert_eq!(rig.hw.shown_line(1), "-> Local mode");

    rig.input(InputEvent::Confirm).unwrap();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Local));
    assert!(rig.sink.contains(&AppEvent::ModeEntered(OperatingMode::Local)));
}

#[test]
fn back_leaves_local_and_releases_everything() {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Local).unwrap();
    rig.console("relay set 1 on");
    rig.console("relay set 4 on");

    rig.input(InputEvent::Back).unwrap();
    assert_eq!(rig.ctl.active_mode(), None);
    assert!(!rig.net.console_open);
    assert!(!rig.hw.gps_open);
    assert!(rig.hw.servos.iter().all(|s| !s.attached));
    assert!(!rig.hw.any_actuator_claimed());
    for n in 1..=4 {
        assert!(!rig.hw.relay_level(n));
    }
    assert!(rig.sink.contains(&AppEvent::ModeExited(OperatingMode::Local)));
    assert_eq!(rig.hw.shown_line(0), "== ORION ==");
}

#[test]
fn confirm_inside_a_mode_is_ignored() {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Local).unwrap();
    rig.input(InputEvent::Confirm).unwrap();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Local));
}

#[test]
fn entering_a_mode_exits_the_current_one_first() {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Local).unwrap();
    assert!(rig.net.console_open);

    rig.enter(OperatingMode::Cloud).unwrap();
    assert_eq!(rig.ctl.active_mode(), Some(OperatingMode::Cloud));
    assert!(!rig.net.console_open);
    assert!(rig.hw.servos.iter().all(|s| !s.attached));

    let entered_or_exited: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ModeEntered(_) | AppEvent::ModeExited(_)))
        .cloned()
        .collect();
    assert_eq!(
        entered_or_exited,
        [
            AppEvent::ModeEntered(OperatingMode::Local),
            AppEvent::ModeExited(OperatingMode::Local),
            AppEvent::ModeEntered(OperatingMode::Cloud),
        ]
    );
}

#[test]
fn exit_with_lock_open_closes_it() {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Local).unwrap();
    rig.console("lock set on");
    assert!(rig.hw.lock_level());

    rig.exit();
    assert!(!rig.hw.lock_level());
    assert!(!rig.ctl.devices().lock_timer.is_armed());
    assert!(rig.sink.contains(&AppEvent::LockChanged { open: false, source: LockSource::ModeExit }));

    // Nothing left to relock later.
    rig.run_for(5_000, 100);
    assert_eq!(rig.hw.history(pins::LOCK_GPIO).iter().filter(|h| **h).count(), 1);
}

#[test]
fn exit_from_menu_is_a_no_op() {
    let mut rig = Rig::new();
    rig.exit();
    assert!(rig.sink.events.is_empty());
}

#[test]
fn relock_deadline_follows_config() {
    let config = SystemConfig { lock_hold_ms: 1_500, ..SystemConfig::default() };
    let mut rig = Rig::with_config(config);
    rig.enter(OperatingMode::Local).unwrap();
    rig.console("lock set on");
    rig.run_for(1_400, 100);
    assert!(rig.hw.lock_level());
    rig.run_for(100, 100);
    assert!(!rig.hw.lock_level());
    assert!(rig.sink.contains(&AppEvent::LockChanged { open: false, source: LockSource::SafetyTimer }));
}

#[test]
fn re_unlock_restarts_the_hold() {
    let mut rig = Rig::new();
    rig.enter(OperatingMode::Local).unwrap();
    rig.console("lock set on");
    rig.run_for(2_000, 100);
    rig.console("lock set on");
    rig.run_for(2_900, 100);
    assert!(rig.hw.lock_level());
    rig.run_for(100, 100);
    assert!(!rig.hw.lock_level());
}

#[test]
fn menu_ticks_touch_nothing() {
    let mut rig = Rig::new();
    rig.run_for(10_000, 100);
    assert!(rig.hw.writes.is_empty());
    assert!(rig.net.connects.is_empty());
    assert!(rig.sink.events.is_empty());
}
