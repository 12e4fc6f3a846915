//! Mode controller: decides who owns the shared hardware.
//!
//! ```text
//!            enter(Local)            enter(Cloud)           enter(Test)
//!   Menu ───────────────▶ Local   Menu ───────────▶ Cloud   Menu ─────────▶ Test
//!    ▲                      │       ▲                 │       ▲               │
//!    └──────── exit ────────┘       └───── exit ──────┘       └──── exit ─────┘
//! ```
//!
//! At most one session exists at a time; it lives inside [`Session`], so
//! "two modes active" cannot be represented. Entering a mode always exits
//! the current one first, and exit always leaves the lock closed, the
//! relock timer disarmed and every actuator pin released.
//!
//! Each loop iteration the controller ticks the active session, then the
//! lock safety timer, whatever the mode.

use core::mem;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::actuators::ActuatorState;
use crate::app::events::{AppEvent, LockSource};
use crate::app::ports::{Board, EventSink, Network};
use crate::cloud::CloudSession;
use crate::config::SystemConfig;
use crate::error::Result;
use crate::harness::{HarnessOutcome, TestHarness};
use crate::local::LocalSession;
use crate::pins;
use crate::safety::{LockSafetyTimer, LockTimerEvent};
use crate::sensors::light::LightSensor;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperatingMode {
    Local = 0,
    Cloud = 1,
    Test = 2,
}

impl OperatingMode {
    pub const COUNT: usize = 3;

    /// Out-of-range indices wrap.
    pub fn from_index(idx: usize) -> Self {
        match idx % Self::COUNT {
            0 => Self::Local,
            1 => Self::Cloud,
            _ => Self::Test,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Cloud => "Cloud",
            Self::Test => "Test",
        }
    }
}

/// Operator button gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Confirm,
    Back,
}

// ---------------------------------------------------------------------------
// Shared hardware state
// ---------------------------------------------------------------------------

/// State the controller owns and lends to the active session.
pub struct Devices {
    pub actuators: ActuatorState,
    pub lock_timer: LockSafetyTimer,
    pub light: LightSensor,
}

impl Devices {
    pub fn new(config: &SystemConfig) -> Self {
        let mut light = LightSensor::new(pins::LDR_ADC_GPIO);
        light.set_calibration(config.ldr_cal_min, config.ldr_cal_max);
        light.set_smoothing(config.ldr_smoothing);
        Self {
            actuators: ActuatorState::new(),
            lock_timer: LockSafetyTimer::from_config(config),
            light,
        }
    }
}

/// The active owner of the hardware.
enum Session {
    Menu,
    Local(LocalSession),
    Cloud(CloudSession),
    Test(TestHarness),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct ModeController {
    config: SystemConfig,
    devices: Devices,
    session: Session,
    /// Mode highlighted in the menu.
    menu_choice: OperatingMode,
    /// Seed for broker client ids.
    seed: u32,
}

impl ModeController {
    pub fn new(config: SystemConfig, seed: u32) -> Self {
        Self {
            devices: Devices::new(&config),
            menu_choice: config.boot_mode,
            config,
            session: Session::Menu,
            seed,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    /// `None` while in the menu.
    pub fn active_mode(&self) -> Option<OperatingMode> {
        match self.session {
            Session::Menu => None,
            Session::Local(_) => Some(OperatingMode::Local),
            Session::Cloud(_) => Some(OperatingMode::Cloud),
            Session::Test(_) => Some(OperatingMode::Test),
        }
    }

    pub fn menu_choice(&self) -> OperatingMode {
        self.menu_choice
    }

    /// Broker connection details while in Cloud mode.
    pub fn cloud(&self) -> Option<&CloudSession> {
        match &self.session {
            Session::Cloud(s) => Some(s),
            _ => None,
        }
    }

    pub fn harness(&self) -> Option<&TestHarness> {
        match &self.session {
            Session::Test(h) => Some(h),
            _ => None,
        }
    }

    /// Exit the current mode, claim the pins, run `mode`'s entry. On
    /// failure everything claimed is released and the controller stays in
    /// the menu.
    pub fn enter(
        &mut self,
        mode: OperatingMode,
        hw: &mut impl Board,
        net: &mut impl Network,
        events: &mut impl EventSink,
    ) -> Result<()> {
        self.exit(hw, net, events);
        info!("Mode: entering {}", mode.name());

        self.devices.actuators.claim(hw);
        let entered = match mode {
            OperatingMode::Local => {
                let mut session = LocalSession::new(&self.config);
                session
                    .enter(hw, net, &mut self.devices)
                    .map(|()| Session::Local(session))
            }
            OperatingMode::Cloud => {
                self.seed = self.seed.wrapping_add(0x9E37_79B9);
                let mut session = CloudSession::new(&self.config, self.seed);
                session
                    .enter(hw, net, &mut self.devices, events)
                    .map(|()| Session::Cloud(session))
            }
            OperatingMode::Test => {
                let mut harness = TestHarness::new(self.config.gps_baud, self.config.gps_bytes_per_tick);
                harness.enter(hw);
                Ok(Session::Test(harness))
            }
        };

        match entered {
            Ok(session) => {
                self.session = session;
                self.menu_choice = mode;
                events.emit(&AppEvent::ModeEntered(mode));
                Ok(())
            }
            Err(error) => {
                warn!("Mode: {} entry failed ({error})", mode.name());
                self.devices.lock_timer.disarm();
                self.devices.actuators.release(hw);
                events.emit(&AppEvent::ModeEntryFailed { mode, error });
                self.draw_menu(hw);
                Err(error)
            }
        }
    }

    /// Release everything the active mode opened and return to the menu.
    pub fn exit(&mut self, hw: &mut impl Board, net: &mut impl Network, events: &mut impl EventSink) {
        let mode = match mem::replace(&mut self.session, Session::Menu) {
            Session::Menu => return,
            Session::Local(mut s) => {
                s.exit(hw, net);
                OperatingMode::Local
            }
            Session::Cloud(mut s) => {
                s.exit(hw, net, events);
                OperatingMode::Cloud
            }
            Session::Test(mut h) => {
                h.exit(hw);
                OperatingMode::Test
            }
        };

        let was_open = self.devices.actuators.lock_open();
        self.devices.lock_timer.lock(&mut self.devices.actuators, hw);
        if was_open {
            events.emit(&AppEvent::LockChanged { open: false, source: LockSource::ModeExit });
        }
        self.devices.actuators.release(hw);

        info!("Mode: left {}", mode.name());
        events.emit(&AppEvent::ModeExited(mode));
        self.draw_menu(hw);
    }

    /// One loop iteration: the active session, then the relock timer.
    pub fn tick(&mut self, hw: &mut impl Board, net: &mut impl Network, events: &mut impl EventSink) {
        match &mut self.session {
            Session::Menu => {}
            Session::Local(s) => s.tick(hw, net, &mut self.devices, events),
            Session::Cloud(s) => s.tick(hw, net, &mut self.devices, events),
            Session::Test(h) => h.tick(hw, &mut self.devices),
        }

        let now = hw.now_ms();
        if let Some(LockTimerEvent::Relocked) =
            self.devices.lock_timer.tick(now, &mut self.devices.actuators, hw)
        {
            events.emit(&AppEvent::LockChanged { open: false, source: LockSource::SafetyTimer });
            if let Session::Cloud(s) = &mut self.session {
                s.on_relocked(net, events);
            }
        }
    }

    /// Route a button gesture.
    ///
    /// In the menu, Back cycles the highlighted mode and Confirm enters it.
    /// In Test mode the harness gets it. In Local and Cloud, Back leaves
    /// the mode.
    pub fn handle_input(
        &mut self,
        input: InputEvent,
        hw: &mut impl Board,
        net: &mut impl Network,
        events: &mut impl EventSink,
    ) -> Result<()> {
        if let Session::Test(h) = &mut self.session {
            if h.handle_input(input, hw, &mut self.devices, events) == HarnessOutcome::ExitToMenu {
                self.exit(hw, net, events);
            }
            return Ok(());
        }
        match (self.active_mode(), input) {
            (None, InputEvent::Confirm) => return self.enter(self.menu_choice, hw, net, events),
            (None, InputEvent::Back) => {
                self.menu_choice = OperatingMode::from_index(self.menu_choice as usize + 1);
                self.draw_menu(hw);
            }
            (Some(_), InputEvent::Back) => self.exit(hw, net, events),
            (Some(_), InputEvent::Confirm) => {}
        }
        Ok(())
    }

    fn draw_menu(&self, hw: &mut impl Board) {
        hw.clear();
        hw.print_line(0, "== ORION ==");
        for i in 0..OperatingMode::COUNT {
            let mode = OperatingMode::from_index(i);
            let marker = if mode == self.menu_choice { "-> " } else { "   " };
            hw.print_line(i as u8 + 1, &format!("{marker}{} mode", mode.name()));
        }
        hw.flush();
    }
}
