//! Kinematics
//!
//! Tick counts become joint angles, joint angles become handle or
//! end-effector positions. Lengths are in millimeters, angles in radians.
//!
//! - [`rotary`]: closed-form 1-DOF and 2-DOF capstan linkages
//! - [`delta`]: forward/inverse kinematics of the 3-arm delta mechanism
//! - [`handle`]: position/velocity bookkeeping per tracked point

pub mod delta;
pub mod handle;
pub mod rotary;

pub use delta::{DeltaGeometry, DeltaMechanismState, WorkspaceBounds};
pub use handle::HandleState;
pub use rotary::{PlanarPose, RotaryGeometry};

use core::f32::consts::TAU;

/// Encoder counts per motor revolution
pub const DEFAULT_COUNTS_PER_REV: u32 = 48;

/// Kinematic solve failures
///
/// A failed solve never produces a pose. Callers keep the last valid one
/// and skip actuation for that iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KinematicsError {
    /// Forward solve: the three arm spheres do not intersect
    NoIntersection,
    /// Inverse solve: the given arm (0..3) cannot reach the target
    Unreachable { arm: u8 },
    /// Target lies outside the configured workspace bounds
    OutOfWorkspace,
    /// Degenerate configuration (parallel arms, zero-length denominator)
    Singular,
}

/// Convert a tick count to a motor angle in radians
///
/// A zero resolution yields zero rather than a division by zero.
pub fn joint_angle(ticks: i32, counts_per_rev: u32) -> f32 {
    if counts_per_rev == 0 {
        return 0.0;
    }
    ticks as f32 * TAU / counts_per_rev as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_joint_angle_two_revolutions() {
        let angle = joint_angle(96, 48);
        assert!((angle - 4.0 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_joint_angle_negative_and_zero() {
        assert!((joint_angle(-12, 48) + PI / 2.0).abs() < 1e-6);
        assert_eq!(joint_angle(0, 48), 0.0);
        assert_eq!(joint_angle(100, 0), 0.0);
    }
}
