//! Virtual environment rendering
//!
//! One [`ForceModel`] is active per device. Each iteration the control loop
//! hands it the tracked points ([`EnvironmentInput`]) and gets back a
//! [`ForceCommand`]: one force per tracked point, a proxy point for the
//! visualizer and one scalar the host can plot.
//!
//! # Units
//!
//! | Quantity  | Unit  |
//! |-----------|-------|
//! | position  | mm    |
//! | velocity  | mm/s  |
//! | stiffness | N/m   |
//! | damping   | N·s/m |
//! | force     | N     |
//! | mass      | kg    |
//!
//! Stiffness and damping are given per meter, so every model multiplies
//! millimeter quantities by [`MM_TO_M`] before producing newtons.
//!
//! Single-handle models act on tracked point 0 and leave the others at zero
//! force. [`RigidSphere`] is evaluated for every tracked point.

mod dynamics;
mod field;
mod friction;
mod sphere;
mod surface;
mod teleop;
mod wall;

pub use dynamics::MassSpringDamper;
pub use field::{Damping, Spring};
pub use friction::Friction;
pub use sphere::RigidSphere;
pub use surface::{BumpValley, HardSurface, Texture};
pub use teleop::Teleoperation;
pub use wall::{Axis, Wall, WallSide};

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::kinematics::HandleState;

pub use crate::jacobian::MM_TO_M;

/// Thumb plus two fingers
pub const MAX_TRACKED_POINTS: usize = 3;

/// Kinematic state handed to a model each iteration
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentInput<'a> {
    /// Tracked points; point 0 is the primary handle
    pub points: &'a [HandleState],
    /// Time since the previous render (s)
    pub dt: f32,
    /// Partner device position, if one has been received (mm)
    pub remote: Option<Vector3<f32>>,
}

impl<'a> EnvironmentInput<'a> {
    pub fn new(points: &'a [HandleState], dt: f32) -> Self {
        Self {
            points,
            dt,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Option<Vector3<f32>>) -> Self {
        self.remote = remote;
        self
    }

    /// Primary handle, or a resting handle at the origin when none is tracked
    pub fn primary(&self) -> HandleState {
        self.points.first().copied().unwrap_or_default()
    }
}

/// Output of one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceCommand {
    /// Force per tracked point (N)
    pub forces: [Vector3<f32>; MAX_TRACKED_POINTS],
    /// Surface-constrained point of the primary handle (mm)
    pub proxy: Vector3<f32>,
    /// Model-specific value reported in telemetry
    pub parameter: f32,
}

impl ForceCommand {
    /// No force, proxy at the handle
    pub fn free(proxy: Vector3<f32>) -> Self {
        Self {
            forces: [Vector3::zeros(); MAX_TRACKED_POINTS],
            proxy,
            parameter: 0.0,
        }
    }

    /// A force on the primary handle only
    pub fn primary(force: Vector3<f32>, proxy: Vector3<f32>) -> Self {
        let mut command = Self::free(proxy);
        command.forces[0] = force;
        command
    }

    pub fn with_parameter(mut self, parameter: f32) -> Self {
        self.parameter = parameter;
        self
    }

    /// Force on the primary handle
    pub fn primary_force(&self) -> Vector3<f32> {
        self.forces[0]
    }

    /// True when every component of every force is finite
    pub fn is_finite(&self) -> bool {
        self.forces.iter().all(|f| f.iter().all(|c| c.is_finite()))
    }
}

/// The active virtual environment
///
/// Selected once from configuration. Stateful variants keep their state
/// inside the variant between calls to [`ForceModel::render`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ForceModel {
    #[default]
    None,
    Spring(Spring),
    Wall(Wall),
    Damping(Damping),
    Friction(Friction),
    HardSurface(HardSurface),
    BumpValley(BumpValley),
    Texture(Texture),
    MassSpringDamper(MassSpringDamper),
    Teleoperation(Teleoperation),
    RigidSphere(RigidSphere),
}

impl ForceModel {
    /// Compute this iteration's forces
    pub fn render(&mut self, input: &EnvironmentInput<'_>) -> ForceCommand {
        match self {
            ForceModel::None => ForceCommand::free(input.primary().position),
            ForceModel::Spring(model) => model.render(input),
            ForceModel::Wall(model) => model.render(input),
            ForceModel::Damping(model) => model.render(input),
            ForceModel::Friction(model) => model.render(input),
            ForceModel::HardSurface(model) => model.render(input),
            ForceModel::BumpValley(model) => model.render(input),
            ForceModel::Texture(model) => model.render(input),
            ForceModel::MassSpringDamper(model) => model.render(input),
            ForceModel::Teleoperation(model) => model.render(input),
            ForceModel::RigidSphere(model) => model.render(input),
        }
    }

    /// Drop any state carried between iterations
    pub fn reset(&mut self) {
        match self {
            ForceModel::HardSurface(model) => model.reset(),
            ForceModel::MassSpringDamper(model) => model.reset(),
            _ => {}
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ForceModel::None => "none",
            ForceModel::Spring(_) => "spring",
            ForceModel::Wall(_) => "wall",
            ForceModel::Damping(_) => "damping",
            ForceModel::Friction(_) => "friction",
            ForceModel::HardSurface(_) => "hard_surface",
            ForceModel::BumpValley(_) => "bump_valley",
            ForceModel::Texture(_) => "texture",
            ForceModel::MassSpringDamper(_) => "mass_spring_damper",
            ForceModel::Teleoperation(_) => "teleoperation",
            ForceModel::RigidSphere(_) => "rigid_sphere",
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    /// Handle at `position` moving with `velocity`
    pub fn handle(position: [f32; 3], velocity: [f32; 3]) -> HandleState {
        let mut state = HandleState::new();
        state.position = Vector3::from(position);
        state.velocity = Vector3::from(velocity);
        state
    }
}
