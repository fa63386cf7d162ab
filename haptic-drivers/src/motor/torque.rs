//! Torque-controlled motor bank
//!
//! The control loop speaks newton-meters; the motor driver board takes a
//! PWM duty and a direction. The conversion is a single gain:
//!
//! ```text
//! duty = clamp(|τ| · gain, 0, 1) · sign(τ)
//! ```
//!
//! A torque that is NaN or infinite drives zero duty.

use haptic_core::control::TorqueActuator;
use haptic_core::encoder::MAX_AXES;
use haptic_hal::MotorOutput;

use crate::DriveError;

/// Signed duty fraction for `torque_nm` with `gain` duty per N·m
pub fn torque_to_duty(torque_nm: f32, gain: f32) -> f32 {
    if !torque_nm.is_finite() || !gain.is_finite() {
        return 0.0;
    }
    let magnitude = (torque_nm.abs() * gain).clamp(0.0, 1.0);
    if torque_nm < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Force-feedback motors driven by torque
///
/// Wraps a [`MotorOutput`] and remembers the last duty written to each
/// motor.
pub struct TorqueMotorBank<M> {
    output: M,
    gain: f32,
    duties: [f32; MAX_AXES],
}

impl<M: MotorOutput> TorqueMotorBank<M> {
    /// Create a bank with `gain` duty fraction per N·m
    pub fn new(output: M, gain: f32) -> Self {
        Self {
            output,
            gain,
            duties: [0.0; MAX_AXES],
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Last duty written to `motor`
    pub fn duty(&self, motor: u8) -> f32 {
        self.duties.get(motor as usize).copied().unwrap_or(0.0)
    }

    /// Get a reference to the underlying output
    pub fn output(&self) -> &M {
        &self.output
    }

    fn write(&mut self, motor: u8, duty: f32) -> Result<(), DriveError> {
        if motor >= self.output.motor_count() {
            return Err(DriveError::InvalidMotor(motor));
        }
        let duty = if duty.is_finite() { duty.clamp(-1.0, 1.0) } else { 0.0 };
        self.output
            .set_duty(motor, duty)
            .map_err(|_| DriveError::Output)?;
        if let Some(slot) = self.duties.get_mut(motor as usize) {
            *slot = duty;
        }
        Ok(())
    }
}

impl<M: MotorOutput> TorqueActuator for TorqueMotorBank<M> {
    type Error = DriveError;

    fn apply_torque(&mut self, motor: u8, torque_nm: f32) -> Result<(), DriveError> {
        self.write(motor, torque_to_duty(torque_nm, self.gain))
    }

    fn set_duty(&mut self, motor: u8, duty: f32) -> Result<(), DriveError> {
        self.write(motor, duty)
    }

    fn stop_all(&mut self) -> Result<(), DriveError> {
        self.output.stop_all().map_err(|_| DriveError::Output)?;
        self.duties = [0.0; MAX_AXES];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptic_core::config::DEFAULT_TORQUE_TO_DUTY;
    use proptest::prelude::*;

    /// Records the last duty per motor
    struct MockOutput {
        duties: [f32; 3],
        fail: bool,
    }

    impl MockOutput {
        fn new() -> Self {
            Self {
                duties: [0.0; 3],
                fail: false,
            }
        }
    }

    impl MotorOutput for MockOutput {
        type Error = ();

        fn motor_count(&self) -> u8 {
            3
        }

        fn set_duty(&mut self, motor: u8, fraction: f32) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.duties[motor as usize] = fraction;
            Ok(())
        }
    }

    #[test]
    fn test_duty_scales_with_gain() {
        let duty = torque_to_duty(0.01, DEFAULT_TORQUE_TO_DUTY);
        assert!((duty - 0.6513).abs() < 1e-5);
        assert!((torque_to_duty(-0.01, DEFAULT_TORQUE_TO_DUTY) + 0.6513).abs() < 1e-5);
    }

    #[test]
    fn test_duty_clamps_and_keeps_sign() {
        assert_eq!(torque_to_duty(1.0, DEFAULT_TORQUE_TO_DUTY), 1.0);
        assert_eq!(torque_to_duty(-1.0, DEFAULT_TORQUE_TO_DUTY), -1.0);
        assert_eq!(torque_to_duty(0.0, DEFAULT_TORQUE_TO_DUTY), 0.0);
    }

    #[test]
    fn test_non_finite_torque_is_zero_duty() {
        assert_eq!(torque_to_duty(f32::NAN, DEFAULT_TORQUE_TO_DUTY), 0.0);
        assert_eq!(torque_to_duty(f32::INFINITY, DEFAULT_TORQUE_TO_DUTY), 0.0);
        assert_eq!(torque_to_duty(0.5, f32::NAN), 0.0);
    }

    #[test]
    fn test_bank_writes_output() {
        let mut bank = TorqueMotorBank::new(MockOutput::new(), DEFAULT_TORQUE_TO_DUTY);
        bank.apply_torque(1, -0.005).unwrap();
        assert!((bank.output().duties[1] + 0.32565).abs() < 1e-5);
        assert_eq!(bank.duty(1), bank.output().duties[1]);
    }

    #[test]
    fn test_bank_rejects_unknown_motor() {
        let mut bank = TorqueMotorBank::new(MockOutput::new(), DEFAULT_TORQUE_TO_DUTY);
        assert_eq!(bank.apply_torque(3, 0.01), Err(DriveError::InvalidMotor(3)));
    }

    #[test]
    fn test_raw_duty_and_stop() {
        let mut bank = TorqueMotorBank::new(MockOutput::new(), DEFAULT_TORQUE_TO_DUTY);
        bank.set_duty(0, 0.25).unwrap();
        assert_eq!(bank.output().duties[0], 0.25);
        bank.set_duty(2, 3.0).unwrap();
        assert_eq!(bank.output().duties[2], 1.0);
        bank.stop_all().unwrap();
        assert_eq!(bank.output().duties, [0.0; 3]);
        assert_eq!(bank.duty(0), 0.0);
    }

    #[test]
    fn test_output_failure_maps_to_drive_error() {
        let mut output = MockOutput::new();
        output.fail = true;
        let mut bank = TorqueMotorBank::new(output, DEFAULT_TORQUE_TO_DUTY);
        assert_eq!(bank.apply_torque(0, 0.01), Err(DriveError::Output));
    }

    proptest! {
        #[test]
        fn prop_duty_bounded_and_signed(torque in -10.0f32..10.0, gain in 0.0f32..500.0) {
            let duty = torque_to_duty(torque, gain);
            prop_assert!((-1.0..=1.0).contains(&duty));
            prop_assert!(duty == 0.0 || duty.signum() == torque.signum());
        }
    }
}
