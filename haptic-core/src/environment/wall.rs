//! Unilateral virtual wall

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EnvironmentInput, ForceCommand, MM_TO_M};

/// Cartesian axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f32> {
        let mut unit = Vector3::zeros();
        unit[self.index()] = 1.0;
        unit
    }
}

/// Which side of the wall plane is solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WallSide {
    /// Solid for coordinates above the plane
    #[default]
    Above,
    /// Solid for coordinates below the plane (a floor on the y axis)
    Below,
}

impl WallSide {
    /// Outward normal sign along the axis
    const fn sign(self) -> f32 {
        match self {
            WallSide::Above => -1.0,
            WallSide::Below => 1.0,
        }
    }
}

/// Penetration-proportional wall with contact damping
///
/// The force always points out of the wall: damping can slow the exit but
/// never pulls the handle back in.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Wall {
    pub axis: Axis,
    pub side: WallSide,
    /// Plane coordinate (mm)
    pub position: f32,
    /// N/m
    pub stiffness: f32,
    /// N·s/m, applied only in contact
    pub damping: f32,
}

impl Default for Wall {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            side: WallSide::Above,
            position: 0.0,
            stiffness: 1000.0,
            damping: 0.0,
        }
    }
}

impl Wall {
    /// Depth of `point` inside the wall (mm), zero outside
    pub fn penetration(&self, point: &Vector3<f32>) -> f32 {
        let coordinate = point[self.axis.index()];
        let depth = (self.position - coordinate) * self.side.sign();
        depth.max(0.0)
    }

    /// `point` moved back onto the wall plane if it is inside
    pub fn project(&self, point: &Vector3<f32>) -> Vector3<f32> {
        let mut projected = *point;
        if self.penetration(point) > 0.0 {
            projected[self.axis.index()] = self.position;
        }
        projected
    }

    /// Outward force magnitude for a given penetration and velocity (N)
    pub(crate) fn contact_force(&self, penetration: f32, velocity: &Vector3<f32>) -> f32 {
        let normal_velocity = velocity[self.axis.index()] * self.side.sign();
        let push = self.stiffness * penetration * MM_TO_M - self.damping * normal_velocity * MM_TO_M;
        push.max(0.0)
    }

    pub(crate) fn normal(&self) -> Vector3<f32> {
        self.axis.unit() * self.side.sign()
    }

    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let penetration = self.penetration(&handle.position);
        let proxy = self.project(&handle.position);
        if penetration <= 0.0 {
            return ForceCommand::free(proxy);
        }
        let magnitude = self.contact_force(penetration, &handle.velocity);
        ForceCommand::primary(self.normal() * magnitude, proxy).with_parameter(penetration)
    }
}
