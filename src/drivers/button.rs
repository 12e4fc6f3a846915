//! Debounced confirm button with short/long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch on the boot strap pin, internal pull-up.
//! The main loop samples the level every tick and runs the debounce +
//! gesture state machine; no interrupt is needed at a 10 ms loop period.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                      | Event     |
//! |-------------|--------------------------------|-----------|
//! | Short press | Released before 1 s            | `Confirm` |
//! | Long press  | Held for 1 s (fires while held)| `Back`    |

use crate::mode::InputEvent;

const DEBOUNCE_MS: u64 = 50;
const LONG_PRESS_MS: u64 = 1000;

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u64 },
    Pressed { since_ms: u64 },
    /// Long press already reported; wait for release.
    WaitRelease,
}

pub struct ButtonDriver {
    gpio: i32,
    state: GestureState,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            state: GestureState::Idle,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Sample the pin and advance. Call once per loop iteration.
    pub fn poll(&mut self, now_ms: u64) -> Option<InputEvent> {
        let pressed = !crate::drivers::hw_init::gpio_read(self.gpio);
        self.tick(now_ms, pressed)
    }

    /// Advance with an explicit raw level (true = held down).
    pub fn tick(&mut self, now_ms: u64, pressed: bool) -> Option<InputEvent> {
        match self.state {
            GestureState::Idle => {
                if pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if !pressed {
                    // Bounce.
                    self.state = GestureState::Idle;
                } else if now_ms.saturating_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = GestureState::Pressed { since_ms };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if !pressed {
                    self.state = GestureState::Idle;
                    return Some(InputEvent::Confirm);
                }
                if now_ms.saturating_sub(since_ms) >= LONG_PRESS_MS {
                    self.state = GestureState::WaitRelease;
                    return Some(InputEvent::Back);
                }
                None
            }

            GestureState::WaitRelease => {
                if !pressed {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}
