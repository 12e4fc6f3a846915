//! Test mode: hardware self-test harness.
//!
//! A potentiometer moves the cursor over the test menu and the confirm
//! button starts the highlighted test. Tests are deadline-driven step
//! machines advanced once per tick, so the loop (and the lock safety
//! timer) keeps running while a test animates.
//!
//! GPS and servos are only opened inside their own test and closed as
//! soon as it ends.

use log::{info, warn};

use crate::app::events::{AppEvent, LockSource};
use crate::app::ports::{Board, EventSink};
use crate::console::SERVO_COUNT;
use crate::mode::{Devices, InputEvent};
use crate::pins;

const RELAY_ON_MS: u64 = 500;
const RELAY_OFF_MS: u64 = 200;
const LOCK_COUNTDOWN_S: u8 = 3;
const CLIMATE_SETTLE_MS: u64 = 1000;
const GPS_REDRAW_MS: u64 = 500;
const SERVO_ANGLES: [u8; 3] = [0, 90, 180];
const SERVO_HOLD_MS: u64 = 1000;
const DONE_HOLD_MS: u64 = 1000;

/// ADC span the potentiometer is divided over.
const POT_SPAN: u32 = 4096;
const POT_RESOLUTION_BITS: u8 = 12;

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MenuItem {
    Relays = 0,
    Lock = 1,
    Climate = 2,
    Gps = 3,
    Servos = 4,
    Back = 5,
}

impl MenuItem {
    pub const COUNT: usize = 6;

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Relays,
            1 => Self::Lock,
            2 => Self::Climate,
            3 => Self::Gps,
            4 => Self::Servos,
            _ => Self::Back,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Relays => "Test Relays",
            Self::Lock => "Test Lock",
            Self::Climate => "Test DHT",
            Self::Gps => "Test GPS",
            Self::Servos => "Test Servos",
            Self::Back => "Back",
        }
    }
}

/// Low-pass filtered potentiometer mapped onto equal ADC bands.
#[derive(Debug, Clone)]
pub struct MenuCursor {
    filtered: u32,
    index: Option<usize>,
    items: usize,
}

impl MenuCursor {
    pub fn new(items: usize) -> Self {
        Self {
            filtered: 0,
            index: None,
            items: items.max(1),
        }
    }

    /// Feed one raw reading. Returns the new index when it changed.
    pub fn update(&mut self, raw: u16) -> Option<usize> {
        self.filtered = (self.filtered * 7 + u32::from(raw)) / 8;
        let step = POT_SPAN / self.items as u32;
        let idx = ((self.filtered / step) as usize).min(self.items - 1);
        if self.index == Some(idx) {
            return None;
        }
        self.index = Some(idx);
        Some(idx)
    }

    pub fn index(&self) -> usize {
        self.index.unwrap_or(0)
    }

    pub fn filtered(&self) -> u32 {
        self.filtered
    }
}

// ---------------------------------------------------------------------------
// Test step machines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestRun {
    /// Relay `relay` (zero based) is on until `until`, then off for the gap.
    Relays { relay: usize, on: bool, until: u64 },
    /// Countdown digit shown until `until`.
    LockCountdown { remaining: u8, until: u64 },
    /// Countdown done, waiting for the safety timer to close the lock.
    LockClosing,
    ClimateSettle { until: u64 },
    /// Result on screen until Confirm.
    ClimateResult,
    Gps { next_draw: u64 },
    Servos { step: usize, until: u64 },
    /// "Done" screen, then the menu.
    Finished { until: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Menu,
    Running(TestRun),
}

/// What the controller should do after a harness call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessOutcome {
    Stay,
    ExitToMenu,
}

pub struct TestHarness {
    state: HarnessState,
    cursor: MenuCursor,
    gps_baud: u32,
    gps_bytes_per_tick: usize,
    servos_attached: bool,
    gps_open: bool,
}

impl TestHarness {
    pub fn new(gps_baud: u32, gps_bytes_per_tick: usize) -> Self {
        Self {
            state: HarnessState::Menu,
            cursor: MenuCursor::new(MenuItem::COUNT),
            gps_baud,
            gps_bytes_per_tick,
            servos_attached: false,
            gps_open: false,
        }
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn selected(&self) -> MenuItem {
        MenuItem::from_index(self.cursor.index())
    }

    /// Pins are already claimed; only the pot needs configuring.
    pub fn enter(&mut self, hw: &mut impl Board) {
        self.state = HarnessState::Menu;
        self.cursor = MenuCursor::new(MenuItem::COUNT);
        hw.configure_adc(pins::POT_ADC_GPIO, POT_RESOLUTION_BITS);
        self.cursor.update(hw.read_adc(pins::POT_ADC_GPIO));
        self.draw_menu(hw);
    }

    /// Close whatever the running test opened.
    pub fn exit(&mut self, hw: &mut impl Board) {
        self.release_test_resources(hw);
        self.state = HarnessState::Menu;
    }

    pub fn tick(&mut self, hw: &mut impl Board, devices: &mut Devices) {
        let now = hw.now_ms();
        match self.state {
            HarnessState::Menu => {
                if self.cursor.update(hw.read_adc(pins::POT_ADC_GPIO)).is_some() {
                    self.draw_menu(hw);
                }
            }
            HarnessState::Running(run) => {
                if let Some(next) = self.step(run, now, hw, devices) {
                    self.state = next;
                }
            }
        }
    }

    pub fn handle_input(
        &mut self,
        input: InputEvent,
        hw: &mut impl Board,
        devices: &mut Devices,
        events: &mut impl EventSink,
    ) -> HarnessOutcome {
        let now = hw.now_ms();
        match (self.state, input) {
            (HarnessState::Menu, InputEvent::Confirm) => {
                let item = self.selected();
                if item == MenuItem::Back {
                    return HarnessOutcome::ExitToMenu;
                }
                info!("Test: starting {}", item.label());
                self.state = HarnessState::Running(self.start(item, now, hw, devices, events));
            }
            (HarnessState::Menu, InputEvent::Back) => return HarnessOutcome::ExitToMenu,
            (HarnessState::Running(TestRun::ClimateResult | TestRun::Gps { .. }), InputEvent::Confirm) => {
                self.release_test_resources(hw);
                self.state = self.finish(now, hw);
            }
            (HarnessState::Running(_), InputEvent::Back) => {
                info!("Test: aborted");
                self.abort(hw, devices, events);
            }
            (HarnessState::Running(_), InputEvent::Confirm) => {}
        }
        HarnessOutcome::Stay
    }

    // ── Test start ────────────────────────────────────────────

    fn start(
        &mut self,
        item: MenuItem,
        now: u64,
        hw: &mut impl Board,
        devices: &mut Devices,
        events: &mut impl EventSink,
    ) -> TestRun {
        hw.clear();
        match item {
            MenuItem::Relays => {
                hw.print_line(0, "TEST RELAYS");
                self.relay_on(0, now, hw, devices)
            }
            MenuItem::Lock => {
                hw.print_line(0, "TEST LOCK");
                hw.print_line(1, "Opening...");
                devices.lock_timer.unlock(now, &mut devices.actuators, hw);
                events.emit(&AppEvent::LockChanged { open: true, source: LockSource::SelfTest });
                hw.print_line(3, &LOCK_COUNTDOWN_S.to_string());
                hw.flush();
                TestRun::LockCountdown { remaining: LOCK_COUNTDOWN_S, until: now + 1000 }
            }
            MenuItem::Climate => {
                hw.print_line(0, "TEST DHT11");
                hw.print_line(1, "Reading...");
                hw.flush();
                TestRun::ClimateSettle { until: now + CLIMATE_SETTLE_MS }
            }
            MenuItem::Gps => {
                hw.gps_begin(self.gps_baud);
                self.gps_open = true;
                hw.print_line(0, "TEST GPS");
                hw.print_line(1, "Searching sats...");
                hw.print_line(2, "[CONFIRM] exit");
                hw.flush();
                TestRun::Gps { next_draw: now }
            }
            MenuItem::Servos => {
                for i in 0..SERVO_COUNT {
                    hw.attach_servo(i);
                }
                self.servos_attached = true;
                hw.print_line(0, "TEST SERVOS");
                self.servo_step(0, now, hw)
            }
            // Handled by the caller.
            MenuItem::Back => TestRun::Finished { until: now },
        }
    }

    // ── Per-tick advance ──────────────────────────────────────

    fn step(&mut self, run: TestRun, now: u64, hw: &mut impl Board, devices: &mut Devices) -> Option<HarnessState> {
        match run {
            TestRun::Relays { relay, on, until } if now >= until => {
                if on {
                    switch_relay(relay, false, hw, devices);
                    Some(HarnessState::Running(TestRun::Relays { relay, on: false, until: now + RELAY_OFF_MS }))
                } else if relay + 1 < crate::actuators::RELAY_COUNT {
                    Some(HarnessState::Running(self.relay_on(relay + 1, now, hw, devices)))
                } else {
                    Some(self.finish(now, hw))
                }
            }
            TestRun::LockCountdown { remaining, until } if now >= until => {
                let remaining = remaining - 1;
                if remaining == 0 {
                    return Some(HarnessState::Running(TestRun::LockClosing));
                }
                hw.print_line(3, &remaining.to_string());
                hw.flush();
                Some(HarnessState::Running(TestRun::LockCountdown { remaining, until: until + 1000 }))
            }
            TestRun::LockClosing if !devices.lock_timer.is_armed() => {
                hw.print_line(4, "Closed.");
                Some(self.finish(now, hw))
            }
            TestRun::ClimateSettle { until } if now >= until => {
                hw.clear();
                hw.print_line(0, "TEST DHT11");
                hw.print_line(1, "Results:");
                match hw.read_climate() {
                    Ok(r) => {
                        hw.print_line(2, &format!("Temp: {} C", r.temperature_c));
                        hw.print_line(3, &format!("Hum:  {} %", r.humidity_pct));
                    }
                    Err(e) => {
                        hw.print_line(2, "Sensor error!");
                        hw.print_line(3, &format!("{e}"));
                    }
                }
                hw.print_line(5, "[CONFIRM] exit");
                hw.flush();
                Some(HarnessState::Running(TestRun::ClimateResult))
            }
            TestRun::Gps { next_draw } => {
                hw.gps_pump(self.gps_bytes_per_tick);
                if now < next_draw {
                    return None;
                }
                self.draw_gps(hw);
                Some(HarnessState::Running(TestRun::Gps { next_draw: now + GPS_REDRAW_MS }))
            }
            TestRun::Servos { step, until } if now >= until => {
                if step + 1 < SERVO_ANGLES.len() {
                    Some(HarnessState::Running(self.servo_step(step + 1, now, hw)))
                } else {
                    self.release_test_resources(hw);
                    Some(self.finish(now, hw))
                }
            }
            TestRun::Finished { until } if now >= until => {
                self.draw_menu(hw);
                Some(HarnessState::Menu)
            }
            _ => None,
        }
    }

    fn relay_on(&mut self, relay: usize, now: u64, hw: &mut impl Board, devices: &mut Devices) -> TestRun {
        switch_relay(relay, true, hw, devices);
        hw.print_line(relay as u8 + 1, &format!("Relay {} ON", relay + 1));
        hw.flush();
        TestRun::Relays { relay, on: true, until: now + RELAY_ON_MS }
    }

    fn servo_step(&mut self, step: usize, now: u64, hw: &mut impl Board) -> TestRun {
        let angle = SERVO_ANGLES[step];
        for i in 0..SERVO_COUNT {
            hw.write_servo(i, angle);
        }
        hw.print_line(2, &format!("Moving to: {angle}"));
        hw.flush();
        TestRun::Servos { step, until: now + SERVO_HOLD_MS }
    }

    fn finish(&mut self, now: u64, hw: &mut impl Board) -> HarnessState {
        hw.print_line(6, "Done.");
        hw.flush();
        HarnessState::Running(TestRun::Finished { until: now + DONE_HOLD_MS })
    }

    fn abort(&mut self, hw: &mut impl Board, devices: &mut Devices, events: &mut impl EventSink) {
        self.release_test_resources(hw);
        devices.actuators.all_relays_off(hw);
        if devices.lock_timer.is_armed() || devices.actuators.lock_open() {
            devices.lock_timer.lock(&mut devices.actuators, hw);
            events.emit(&AppEvent::LockChanged { open: false, source: LockSource::SelfTest });
        }
        self.state = HarnessState::Menu;
        self.draw_menu(hw);
    }

    fn release_test_resources(&mut self, hw: &mut impl Board) {
        if self.servos_attached {
            for i in 0..SERVO_COUNT {
                hw.detach_servo(i);
            }
            self.servos_attached = false;
        }
        if self.gps_open {
            hw.gps_end();
            self.gps_open = false;
        }
    }

    // ── Drawing ───────────────────────────────────────────────

    fn draw_menu(&self, hw: &mut impl Board) {
        hw.clear();
        let selected = self.cursor.index();
        for i in 0..MenuItem::COUNT {
            let marker = if i == selected { "-> " } else { "   " };
            hw.print_line(i as u8, &format!("{marker}{}", MenuItem::from_index(i).label()));
        }
        hw.flush();
    }

    fn draw_gps(&self, hw: &mut impl Board) {
        hw.clear();
        hw.print_line(0, "TEST GPS");
        hw.print_line(1, "[CONFIRM] exit");
        hw.print_line(2, &format!("Sats: {}", hw.gps_satellites()));
        match hw.gps_fix() {
            Some(fix) => {
                hw.print_line(3, &format!("Lat: {:.5}", fix.lat));
                hw.print_line(4, &format!("Lon: {:.5}", fix.lon));
                hw.print_line(5, &format!("Alt: {:.2} m", fix.alt_m));
            }
            None => hw.print_line(3, "Pos: no fix"),
        }
        hw.flush();
    }
}

/// `relay` is zero based.
fn switch_relay(relay: usize, on: bool, hw: &mut impl Board, devices: &mut Devices) {
    if let Err(e) = devices.actuators.set_relay(hw, relay + 1, on) {
        warn!("Test: relay {}: {e}", relay + 1);
    }
}
