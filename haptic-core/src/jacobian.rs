//! Force to motor torque mapping
//!
//! Environment forces are in newtons at the handle, geometry is in
//! millimeters, and motors take newton-meters. Every mapping here applies
//! the 0.001 mm→m factor exactly once, then the capstan reduction between
//! joint and motor.

use nalgebra::{Matrix3, Vector2, Vector3};

use crate::encoder::MAX_AXES;
use crate::kinematics::{DeltaGeometry, KinematicsError, PlanarPose, RotaryGeometry};

/// Millimeter to meter
pub const MM_TO_M: f32 = 0.001;

/// Largest torque magnitude a correct mapping can produce on this hardware
/// (N·m). Debug builds assert against it to catch a missing unit factor.
pub const PLAUSIBLE_TORQUE_NM: f32 = 100.0;

/// Per-motor torques for one iteration (N·m)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TorqueCommand {
    torques: [f32; MAX_AXES],
}

impl TorqueCommand {
    pub const fn zero() -> Self {
        Self {
            torques: [0.0; MAX_AXES],
        }
    }

    /// Set the torque of a zero-based motor; out-of-range motors are ignored
    pub fn set(&mut self, motor: usize, torque: f32) {
        debug_check_torque(torque);
        if let Some(slot) = self.torques.get_mut(motor) {
            *slot = torque;
        }
    }

    pub fn get(&self, motor: usize) -> f32 {
        self.torques.get(motor).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.torques
    }

    /// True when no entry is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.torques.iter().all(|t| t.is_finite())
    }
}

/// Debug-only unit sanity check on a torque about to reach a motor
#[inline]
pub fn debug_check_torque(torque: f32) {
    debug_assert!(
        !torque.is_finite() || torque.abs() < PLAUSIBLE_TORQUE_NM,
        "torque {} N·m is implausible, check mm→m conversion",
        torque
    );
}

/// Joint torque to motor torque through a capstan of `ratio`
pub fn motor_torque(joint_torque: f32, ratio: f32) -> f32 {
    -joint_torque * ratio
}

/// 1-DOF: handle force (N) to motor torque (N·m)
pub fn linear_torque(geometry: &RotaryGeometry, force: f32) -> f32 {
    -(geometry.ratio_a() * geometry.r_ha) * force * MM_TO_M
}

/// 2-DOF: handle force (N) to the two motor torques (N·m)
pub fn planar_torque(geometry: &RotaryGeometry, pose: &PlanarPose, force: Vector2<f32>) -> [f32; 2] {
    let joint = pose.jacobian.transpose() * force * MM_TO_M;
    [
        motor_torque(joint.x, geometry.ratio_a()),
        motor_torque(joint.y, geometry.ratio_b()),
    ]
}

/// Delta velocity Jacobian d(position)/d(joint angles), mm/rad
///
/// Differentiating each forearm constraint `|P − Cᵢ(θᵢ)|² = re²` gives
/// `A·dP = B·dθ` with row `i` of `A` equal to `(P − Cᵢ)ᵀ` and
/// `B = diag((P − Cᵢ)·∂Cᵢ/∂θᵢ)`.
pub fn delta_jacobian(
    geometry: &DeltaGeometry,
    angles: [f32; 3],
    position: &Vector3<f32>,
) -> Result<Matrix3<f32>, KinematicsError> {
    let mut a = Matrix3::zeros();
    let mut b = Matrix3::zeros();
    for (arm, &angle) in angles.iter().enumerate() {
        let arm_vector = position - geometry.elbow(arm, angle);
        a.set_row(arm, &arm_vector.transpose());
        b[(arm, arm)] = arm_vector.dot(&geometry.elbow_rate(arm, angle));
    }
    let a_inv = a.try_inverse().ok_or(KinematicsError::Singular)?;
    let jacobian = a_inv * b;
    if jacobian.iter().all(|v| v.is_finite()) {
        Ok(jacobian)
    } else {
        Err(KinematicsError::Singular)
    }
}

/// Delta: end-effector force (N) to joint torques (N·m)
pub fn delta_joint_torque(jacobian: &Matrix3<f32>, force: &Vector3<f32>) -> Vector3<f32> {
    jacobian.transpose() * force * MM_TO_M
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_torque_sign_and_units() {
        let geometry = RotaryGeometry::default();
        let torque = linear_torque(&geometry, 1.0);
        let expected = -(5.5 / 35.0) * 59.0 * 0.001;
        assert!((torque - expected).abs() < 1e-7);
        assert_eq!(linear_torque(&geometry, 0.0), 0.0);
    }

    #[test]
    fn test_planar_torque_uses_transpose() {
        let geometry = RotaryGeometry::default();
        let pose = geometry.planar_pose(0.7, -1.3);
        let force = Vector2::new(2.0, -1.0);
        let [m1, m2] = planar_torque(&geometry, &pose, force);

        let j = pose.jacobian;
        let tx = (j[(0, 0)] * force.x + j[(1, 0)] * force.y) * 0.001;
        let ty = (j[(0, 1)] * force.x + j[(1, 1)] * force.y) * 0.001;
        assert!((m1 - (-tx * 5.5 / 35.0)).abs() < 1e-6);
        assert!((m2 - (-ty * 5.5 / 59.0)).abs() < 1e-6);
    }

    #[test]
    fn test_delta_jacobian_matches_finite_difference() {
        let geometry = DeltaGeometry::default();
        let angles = [0.2f32, -0.1, 0.35];
        let position = geometry.forward(angles).unwrap();
        let jacobian = delta_jacobian(&geometry, angles, &position).unwrap();

        let h = 1e-3f32;
        for joint in 0..3 {
            let mut plus = angles;
            let mut minus = angles;
            plus[joint] += h;
            minus[joint] -= h;
            let column = (geometry.forward(plus).unwrap() - geometry.forward(minus).unwrap()) / (2.0 * h);
            for row in 0..3 {
                assert!(
                    (column[row] - jacobian[(row, joint)]).abs() < 0.2,
                    "J[{},{}] = {} vs {}",
                    row,
                    joint,
                    jacobian[(row, joint)],
                    column[row]
                );
            }
        }
    }

    #[test]
    fn test_delta_joint_torque_is_transpose_times_force() {
        let geometry = DeltaGeometry::default();
        let position = geometry.forward([0.0; 3]).unwrap();
        let jacobian = delta_jacobian(&geometry, [0.0; 3], &position).unwrap();
        let torque = delta_joint_torque(&jacobian, &Vector3::new(0.0, 0.0, 1.0));
        // Pushing straight up at home loads all three arms equally
        assert!((torque.x - torque.y).abs() < 1e-5);
        assert!((torque.y - torque.z).abs() < 1e-5);
        assert!(torque.x.abs() > 0.0);
    }

    #[test]
    fn test_delta_singular_configuration() {
        let geometry = DeltaGeometry::default();
        // A point coinciding with every elbow gives a zero matrix
        let result = delta_jacobian(&geometry, [0.0; 3], &geometry.elbow(0, 0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_torque_command_ignores_out_of_range() {
        let mut command = TorqueCommand::zero();
        command.set(1, 0.02);
        command.set(MAX_AXES, 1.0);
        assert_eq!(command.get(1), 0.02);
        assert_eq!(command.get(MAX_AXES), 0.0);
        assert!(command.is_finite());
        command.set(0, f32::NAN);
        assert!(!command.is_finite());
    }
}
