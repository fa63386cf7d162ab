//! Vibration cue motors
//!
//! Two eccentric-mass motors driven by amplitude only. Direction is
//! meaningless, so the duty written is always non-negative.

use haptic_hal::MotorOutput;

use crate::DriveError;

/// Number of vibration motors
pub const VIBRATION_CHANNELS: usize = 2;

/// Amplitude-controlled vibration motors
///
/// The amplitude last commanded on each channel is kept so callers can
/// query it; turning a channel off records zero.
pub struct VibrationMotors<M> {
    output: M,
    amplitude: [f32; VIBRATION_CHANNELS],
}

impl<M: MotorOutput> VibrationMotors<M> {
    pub fn new(output: M) -> Self {
        Self {
            output,
            amplitude: [0.0; VIBRATION_CHANNELS],
        }
    }

    /// Drive `channel` at `amplitude`, clamped to `[0, 1]`
    pub fn set(&mut self, channel: u8, amplitude: f32) -> Result<(), DriveError> {
        let index = channel as usize;
        if index >= VIBRATION_CHANNELS {
            return Err(DriveError::InvalidChannel(channel));
        }
        let amplitude = if amplitude.is_nan() {
            0.0
        } else {
            amplitude.clamp(0.0, 1.0)
        };
        self.output
            .set_duty(channel, amplitude)
            .map_err(|_| DriveError::Output)?;
        self.amplitude[index] = amplitude;
        Ok(())
    }

    /// Stop `channel`
    pub fn off(&mut self, channel: u8) -> Result<(), DriveError> {
        self.set(channel, 0.0)
    }

    /// Stop every channel
    pub fn off_all(&mut self) -> Result<(), DriveError> {
        for channel in 0..VIBRATION_CHANNELS as u8 {
            self.off(channel)?;
        }
        Ok(())
    }

    /// Last commanded amplitude of `channel`
    pub fn amplitude(&self, channel: u8) -> Option<f32> {
        self.amplitude.get(channel as usize).copied()
    }

    pub fn is_on(&self, channel: u8) -> bool {
        self.amplitude(channel).is_some_and(|a| a > 0.0)
    }
}
