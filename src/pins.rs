//! GPIO / peripheral pin assignments for the Orion controller board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relays (active HIGH)
// ---------------------------------------------------------------------------

pub const RELAY_GPIOS: [i32; 4] = [26, 27, 14, 12];

// ---------------------------------------------------------------------------
// Electronic lock (HIGH = strike energised = open)
// ---------------------------------------------------------------------------

pub const LOCK_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT11 single-wire data line.
pub const DHT_GPIO: i32 = 23;

/// Light-dependent resistor divider. ADC1 channel 6 on the ESP32.
pub const LDR_ADC_GPIO: i32 = 34;

/// GPS module UART (UART2).
pub const GPS_RX_GPIO: i32 = 16;
pub const GPS_TX_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Servos (LEDC, 50 Hz)
// ---------------------------------------------------------------------------

pub const SERVO_GPIOS: [i32; 3] = [15, 2, 4];

// ---------------------------------------------------------------------------
// Test-mode operator inputs
// ---------------------------------------------------------------------------

/// Menu potentiometer wiper. ADC1 channel 7 on the ESP32.
pub const POT_ADC_GPIO: i32 = 35;

/// Confirm push button (active LOW, internal pull-up).
pub const CONFIRM_BUTTON_GPIO: i32 = 0;

/// All digital outputs owned by the actuator layer, in claim order.
pub const ACTUATOR_GPIOS: [i32; 5] = [
    RELAY_GPIOS[0],
    RELAY_GPIOS[1],
    RELAY_GPIOS[2],
    RELAY_GPIOS[3],
    LOCK_GPIO,
];
