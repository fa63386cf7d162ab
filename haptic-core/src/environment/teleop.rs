//! Bilateral teleoperation

use super::{EnvironmentInput, ForceCommand, MM_TO_M};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Virtual spring-damper between the local handle and the partner's handle
///
/// Both devices run the same model against each other's position, so each
/// operator feels the other. Without a received remote position the force
/// is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Teleoperation {
    /// N/m
    pub stiffness: f32,
    /// N·s/m
    pub damping: f32,
}

impl Default for Teleoperation {
    fn default() -> Self {
        Self {
            stiffness: 200.0,
            damping: 0.5,
        }
    }
}

impl Teleoperation {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let Some(remote) = input.remote else {
            return ForceCommand::free(handle.position);
        };
        let error = handle.position - remote;
        let force = -error * self.stiffness * MM_TO_M - handle.velocity * self.damping * MM_TO_M;
        ForceCommand::primary(force, remote)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::handle;
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_no_remote_means_no_force() {
        let model = Teleoperation::default();
        let points = [handle([30.0, 0.0, 0.0], [50.0, 0.0, 0.0])];
        let command = model.render(&EnvironmentInput::new(&points, 0.001));
        assert_eq!(command.primary_force(), Vector3::zeros());
    }

    #[test]
    fn test_pulls_toward_remote() {
        let model = Teleoperation {
            stiffness: 100.0,
            damping: 0.0,
        };
        let points = [handle([10.0, -4.0, 0.0], [0.0; 3])];
        let input = EnvironmentInput::new(&points, 0.001).with_remote(Some(Vector3::new(0.0, 6.0, 0.0)));
        let command = model.render(&input);
        assert!((command.primary_force().x + 1.0).abs() < 1e-5);
        assert!((command.primary_force().y - 1.0).abs() < 1e-5);
        assert_eq!(command.proxy, Vector3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn test_damping_on_local_velocity() {
        let model = Teleoperation {
            stiffness: 0.0,
            damping: 1.0,
        };
        let points = [handle([0.0; 3], [200.0, 0.0, 0.0])];
        let input = EnvironmentInput::new(&points, 0.001).with_remote(Some(Vector3::zeros()));
        assert!((model.render(&input).primary_force().x + 0.2).abs() < 1e-6);
    }
}
