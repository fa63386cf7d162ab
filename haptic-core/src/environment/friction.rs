//! Karnopp friction

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EnvironmentInput, ForceCommand, MM_TO_M};

/// Coulomb plus viscous friction with a stick band
///
/// Below `stick_velocity` the force ramps linearly up to the static force,
/// which avoids chattering around zero speed. Above it the handle slips
/// against the Coulomb force plus viscous drag.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Friction {
    /// Force at the edge of the stick band (N)
    pub static_force: f32,
    /// Sliding force (N)
    pub coulomb_force: f32,
    /// N·s/m while slipping
    pub viscous: f32,
    /// Stick band half-width (mm/s)
    pub stick_velocity: f32,
}

impl Default for Friction {
    fn default() -> Self {
        Self {
            static_force: 0.4,
            coulomb_force: 0.3,
            viscous: 0.5,
            stick_velocity: 5.0,
        }
    }
}

impl Friction {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let speed = handle.velocity.norm();
        let force = if speed <= self.stick_velocity {
            if self.stick_velocity > 0.0 {
                -handle.velocity * (self.static_force / self.stick_velocity)
            } else {
                Vector3::zeros()
            }
        } else {
            let direction = handle.velocity / speed;
            -direction * self.coulomb_force - handle.velocity * self.viscous * MM_TO_M
        };
        ForceCommand::primary(force, handle.position)
    }
}
