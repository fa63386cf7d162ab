//! Tracked-point position and velocity

use nalgebra::Vector3;

/// Position, velocity and the previous sample of one tracked point
///
/// Velocity is an unfiltered first difference. Unused axes of 1-DOF and
/// 2-DOF devices stay at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleState {
    /// Current position (mm)
    pub position: Vector3<f32>,
    /// Current velocity (mm/s)
    pub velocity: Vector3<f32>,
    previous_position: Vector3<f32>,
    previous_time_us: Option<u64>,
}

impl Default for HandleState {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleState {
    pub const fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            previous_position: Vector3::new(0.0, 0.0, 0.0),
            previous_time_us: None,
        }
    }

    /// Record a new sample taken at `now_us`
    ///
    /// The first sample only seeds the history. A sample with no elapsed
    /// time keeps the previous velocity.
    pub fn update(&mut self, position: Vector3<f32>, now_us: u64) {
        if let Some(previous) = self.previous_time_us {
            let elapsed_us = now_us.saturating_sub(previous);
            if elapsed_us > 0 {
                let dt = elapsed_us as f32 * 1e-6;
                self.velocity = (position - self.previous_position) / dt;
            }
        }
        self.position = position;
        self.previous_position = position;
        self.previous_time_us = Some(now_us);
    }

    /// Position of the previous sample (mm)
    pub fn previous_position(&self) -> Vector3<f32> {
        self.previous_position
    }

    /// Forget the history so the next sample restarts differencing
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
