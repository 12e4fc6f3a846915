//! Hobby servo over a 50 Hz PWM channel.
//!
//! Angle 0..=180 maps linearly onto a 500–2400 µs pulse inside the 20 ms
//! frame. Works with any `embedded_hal::pwm::SetDutyCycle` channel; on
//! target that is an LEDC driver configured at 50 Hz.

use embedded_hal::pwm::SetDutyCycle;

pub const SERVO_FREQ_HZ: u32 = 50;
pub const FRAME_US: u32 = 1_000_000 / SERVO_FREQ_HZ;
pub const MIN_PULSE_US: u32 = 500;
pub const MAX_PULSE_US: u32 = 2400;
pub const MAX_ANGLE: u8 = 180;

pub fn angle_to_pulse_us(angle: u8) -> u32 {
    let angle = u32::from(angle.min(MAX_ANGLE));
    MIN_PULSE_US + (MAX_PULSE_US - MIN_PULSE_US) * angle / u32::from(MAX_ANGLE)
}

/// Duty counts for `pulse_us` given the channel's full-scale duty.
pub fn pulse_to_duty(pulse_us: u32, max_duty: u16) -> u16 {
    (u64::from(pulse_us) * u64::from(max_duty) / u64::from(FRAME_US)) as u16
}

pub struct Servo<P> {
    pwm: P,
    angle: Option<u8>,
}

impl<P: SetDutyCycle> Servo<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, angle: None }
    }

    /// Last commanded angle, `None` while detached.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn is_attached(&self) -> bool {
        self.angle.is_some()
    }

    /// Start pulsing at the centre position.
    pub fn attach(&mut self) -> Result<(), P::Error> {
        self.write(MAX_ANGLE / 2)
    }

    pub fn write(&mut self, angle: u8) -> Result<(), P::Error> {
        let angle = angle.min(MAX_ANGLE);
        let duty = pulse_to_duty(angle_to_pulse_us(angle), self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(duty)?;
        self.angle = Some(angle);
        Ok(())
    }

    /// Stop pulsing; the horn goes limp.
    pub fn detach(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.angle = None;
        Ok(())
    }
}
