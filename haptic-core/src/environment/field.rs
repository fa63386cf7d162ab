//! Springs and viscous damping

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EnvironmentInput, ForceCommand, MM_TO_M};

/// Linear spring pulling the handle to a rest position
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Spring {
    /// N/m
    pub stiffness: f32,
    /// mm
    pub rest: [f32; 3],
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            stiffness: 500.0,
            rest: [0.0; 3],
        }
    }
}

impl Spring {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let stretch = handle.position - Vector3::from(self.rest);
        ForceCommand::primary(-stretch * self.stiffness * MM_TO_M, handle.position)
    }
}

/// Viscous damping against the handle velocity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Damping {
    /// N·s/m
    pub coefficient: f32,
}

impl Default for Damping {
    fn default() -> Self {
        Self { coefficient: 1.0 }
    }
}

impl Damping {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        ForceCommand::primary(
            -handle.velocity * self.coefficient * MM_TO_M,
            handle.position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::handle;
    use super::*;

    #[test]
    fn test_spring_pulls_to_rest() {
        let spring = Spring {
            stiffness: 200.0,
            rest: [5.0, 0.0, 0.0],
        };
        let points = [handle([15.0, -5.0, 0.0], [0.0; 3])];
        let force = spring.render(&EnvironmentInput::new(&points, 0.001)).primary_force();
        // 10 mm at 200 N/m is 2 N back toward rest
        assert!((force.x + 2.0).abs() < 1e-5);
        assert!((force.y - 1.0).abs() < 1e-5);
        assert_eq!(force.z, 0.0);
    }

    #[test]
    fn test_spring_zero_at_rest() {
        let spring = Spring::default();
        let points = [handle([0.0; 3], [100.0, 0.0, 0.0])];
        let force = spring.render(&EnvironmentInput::new(&points, 0.001)).primary_force();
        assert_eq!(force, Vector3::zeros());
    }

    #[test]
    fn test_damping_opposes_velocity() {
        let damping = Damping { coefficient: 2.0 };
        // 250 mm/s is 0.25 m/s
        let points = [handle([1.0, 2.0, 3.0], [250.0, 0.0, -500.0])];
        let force = damping.render(&EnvironmentInput::new(&points, 0.001)).primary_force();
        assert!((force.x + 0.5).abs() < 1e-5);
        assert!((force.z - 1.0).abs() < 1e-5);
    }
}
