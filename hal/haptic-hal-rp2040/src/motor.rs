//! PWM motor outputs
//!
//! Each motor is one PWM channel for the duty plus an optional GPIO for the
//! direction input of its driver. Vibration motors have no direction pin
//! and ignore the sign.

use embassy_rp::gpio::Output;
use embassy_rp::pwm::PwmOutput;
use embedded_hal::pwm::SetDutyCycle;
use haptic_hal::MotorOutput;

/// Errors from [`PwmMotorBank`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmMotorError {
    /// Motor index beyond the bank
    NoMotor(u8),
    /// The PWM slice rejected the compare value
    Duty,
}

/// One motor: PWM duty and direction
pub struct MotorChannel<'d> {
    pwm: PwmOutput<'d>,
    direction: Option<Output<'d>>,
}

impl<'d> MotorChannel<'d> {
    /// Motor with a direction pin; high drives positive duty
    pub fn new(pwm: PwmOutput<'d>, direction: Output<'d>) -> Self {
        Self {
            pwm,
            direction: Some(direction),
        }
    }

    /// Motor with duty only
    pub fn unidirectional(pwm: PwmOutput<'d>) -> Self {
        Self {
            pwm,
            direction: None,
        }
    }

    fn set(&mut self, fraction: f32) -> Result<(), PwmMotorError> {
        let fraction = if fraction.is_finite() {
            fraction.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let magnitude = match self.direction.as_mut() {
            Some(pin) => {
                if fraction < 0.0 {
                    pin.set_low();
                } else {
                    pin.set_high();
                }
                fraction.abs()
            }
            None => fraction.max(0.0),
        };
        let max = self.pwm.max_duty_cycle();
        let compare = (magnitude * f32::from(max)) as u16;
        self.pwm
            .set_duty_cycle(compare.min(max))
            .map_err(|_| PwmMotorError::Duty)
    }
}

/// Bank of `N` PWM motors, numbered in construction order
pub struct PwmMotorBank<'d, const N: usize> {
    motors: [MotorChannel<'d>; N],
}

impl<'d, const N: usize> PwmMotorBank<'d, N> {
    pub fn new(motors: [MotorChannel<'d>; N]) -> Self {
        Self { motors }
    }
}

impl<const N: usize> MotorOutput for PwmMotorBank<'_, N> {
    type Error = PwmMotorError;

    fn motor_count(&self) -> u8 {
        N as u8
    }

    fn set_duty(&mut self, motor: u8, fraction: f32) -> Result<(), Self::Error> {
        self.motors
            .get_mut(motor as usize)
            .ok_or(PwmMotorError::NoMotor(motor))?
            .set(fraction)
    }
}
