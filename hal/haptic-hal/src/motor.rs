//! Motor command primitive
//!
//! The control core hands each motor a signed duty fraction. The sign is the
//! direction, the magnitude the PWM duty. How direction is realized (a DIR
//! pin, two PWM legs of an H-bridge) is up to the implementation.

/// Signed duty-cycle output for a bank of motors
pub trait MotorOutput {
    /// Error type for output operations
    type Error;

    /// Number of motors this output can drive
    fn motor_count(&self) -> u8;

    /// Command one motor
    ///
    /// `motor` is zero-based. `fraction` is in `[-1.0, 1.0]`; implementations
    /// may clamp values outside that range.
    fn set_duty(&mut self, motor: u8, fraction: f32) -> Result<(), Self::Error>;

    /// Drive every motor to zero duty
    fn stop_all(&mut self) -> Result<(), Self::Error> {
        for motor in 0..self.motor_count() {
            self.set_duty(motor, 0.0)?;
        }
        Ok(())
    }
}
