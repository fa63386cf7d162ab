//! Delta mechanism kinematics
//!
//! Three base arms 120° apart, each driving a parallelogram to a moving
//! platform. Arm 1 lies along −y; arms 2 and 3 are rotated by ±120° about z.
//! Joint angle zero is a horizontal upper arm, positive angles swing the
//! elbow down. The base plane is z = 0 and the platform hangs below it.
//!
//! ```text
//!             z=0 ──●── base (side f)
//!                  ╱ rf
//!                 ●  elbow
//!                  ╲ re
//!                   ●  platform (side e)
//! ```

use core::f32::consts::PI;

use libm::{atanf, cosf, sinf, sqrtf};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::KinematicsError;

const SQRT3: f32 = 1.732_050_8;
const TAN30: f32 = 1.0 / SQRT3;
const TAN60: f32 = SQRT3;
const SIN30: f32 = 0.5;
const SIN120: f32 = SQRT3 / 2.0;
const COS120: f32 = -0.5;

/// Denominators smaller than this are treated as zero
const EPSILON: f32 = 1e-6;

/// Link dimensions of a delta mechanism (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeltaGeometry {
    /// Side of the platform triangle
    pub e: f32,
    /// Side of the base triangle
    pub f: f32,
    /// Forearm (parallelogram) length
    pub re: f32,
    /// Upper arm length
    pub rf: f32,
}

impl Default for DeltaGeometry {
    fn default() -> Self {
        Self {
            e: 25.0,
            f: 50.0,
            re: 60.0,
            rf: 30.0,
        }
    }
}

/// Cylindrical workspace limit for inverse solves (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorkspaceBounds {
    pub r_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl Default for WorkspaceBounds {
    fn default() -> Self {
        Self {
            r_max: 60.0,
            z_min: -100.0,
            z_max: -20.0,
        }
    }
}

impl WorkspaceBounds {
    pub fn contains(&self, point: &Vector3<f32>) -> bool {
        let radius = sqrtf(point.x * point.x + point.y * point.y);
        radius <= self.r_max && point.z >= self.z_min && point.z <= self.z_max
    }
}

/// Unit direction of each base arm in the xy plane
pub(crate) const ARM_DIRECTIONS: [(f32, f32); 3] =
    [(0.0, 1.0), (-SIN120, COS120), (SIN120, COS120)];

impl DeltaGeometry {
    /// Offset between the base and platform joint circles
    pub(crate) fn joint_offset(&self) -> f32 {
        (self.f - self.e) * TAN30 / 2.0
    }

    /// Elbow position of `arm` in the platform-shrunk frame
    ///
    /// The platform offset is folded into the base so the three forearm
    /// spheres meet at the end-effector itself.
    pub(crate) fn elbow(&self, arm: usize, angle: f32) -> Vector3<f32> {
        let reach = self.joint_offset() + self.rf * cosf(angle);
        let (ux, uy) = ARM_DIRECTIONS[arm];
        Vector3::new(-reach * ux, -reach * uy, -self.rf * sinf(angle))
    }

    /// d(elbow)/d(angle) of `arm`
    pub(crate) fn elbow_rate(&self, arm: usize, angle: f32) -> Vector3<f32> {
        let (ux, uy) = ARM_DIRECTIONS[arm];
        let s = self.rf * sinf(angle);
        Vector3::new(s * ux, s * uy, -self.rf * cosf(angle))
    }

    /// End-effector position from the three joint angles
    pub fn forward(&self, angles: [f32; 3]) -> Result<Vector3<f32>, KinematicsError> {
        let t = self.joint_offset();

        let y1 = -(t + self.rf * cosf(angles[0]));
        let z1 = -self.rf * sinf(angles[0]);

        let y2 = (t + self.rf * cosf(angles[1])) * SIN30;
        let x2 = y2 * TAN60;
        let z2 = -self.rf * sinf(angles[1]);

        let y3 = (t + self.rf * cosf(angles[2])) * SIN30;
        let x3 = -y3 * TAN60;
        let z3 = -self.rf * sinf(angles[2]);

        let dnm = (y2 - y1) * x3 - (y3 - y1) * x2;
        if dnm.abs() < EPSILON {
            return Err(KinematicsError::Singular);
        }

        let w1 = y1 * y1 + z1 * z1;
        let w2 = x2 * x2 + y2 * y2 + z2 * z2;
        let w3 = x3 * x3 + y3 * y3 + z3 * z3;

        // x = (a1·z + b1)/dnm
        let a1 = (z2 - z1) * (y3 - y1) - (z3 - z1) * (y2 - y1);
        let b1 = -((w2 - w1) * (y3 - y1) - (w3 - w1) * (y2 - y1)) / 2.0;

        // y = (a2·z + b2)/dnm
        let a2 = -(z2 - z1) * x3 + (z3 - z1) * x2;
        let b2 = ((w2 - w1) * x3 - (w3 - w1) * x2) / 2.0;

        // a·z² + b·z + c = 0
        let a = a1 * a1 + a2 * a2 + dnm * dnm;
        let b = 2.0 * (a1 * b1 + a2 * (b2 - y1 * dnm) - z1 * dnm * dnm);
        let c = (b2 - y1 * dnm) * (b2 - y1 * dnm) + b1 * b1
            + dnm * dnm * (z1 * z1 - self.re * self.re);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Err(KinematicsError::NoIntersection);
        }

        let z = -0.5 * (b + sqrtf(discriminant)) / a;
        Ok(Vector3::new((a1 * z + b1) / dnm, (a2 * z + b2) / dnm, z))
    }

    /// Joint angles that place the end-effector at `target`
    pub fn inverse(
        &self,
        bounds: &WorkspaceBounds,
        target: &Vector3<f32>,
    ) -> Result<[f32; 3], KinematicsError> {
        if !bounds.contains(target) {
            return Err(KinematicsError::OutOfWorkspace);
        }
        let (x, y, z) = (target.x, target.y, target.z);
        Ok([
            self.arm_angle(0, x, y, z)?,
            self.arm_angle(1, x * COS120 + y * SIN120, y * COS120 - x * SIN120, z)?,
            self.arm_angle(2, x * COS120 - y * SIN120, y * COS120 + x * SIN120, z)?,
        ])
    }

    /// Circle intersection in the yz plane of one arm
    fn arm_angle(&self, arm: u8, x0: f32, y0: f32, z0: f32) -> Result<f32, KinematicsError> {
        if z0.abs() < EPSILON {
            return Err(KinematicsError::Unreachable { arm });
        }
        let y1 = -0.5 * TAN30 * self.f;
        let y0 = y0 - 0.5 * TAN30 * self.e;

        // z = a + b·y
        let a = (x0 * x0 + y0 * y0 + z0 * z0 + self.rf * self.rf - self.re * self.re - y1 * y1)
            / (2.0 * z0);
        let b = (y1 - y0) / z0;

        let d = -(a + b * y1) * (a + b * y1) + self.rf * (b * b * self.rf + self.rf);
        if d < 0.0 {
            return Err(KinematicsError::Unreachable { arm });
        }

        // Outer elbow
        let yj = (y1 - a * b - sqrtf(d)) / (b * b + 1.0);
        let zj = a + b * yj;
        let denominator = y1 - yj;
        if denominator.abs() < EPSILON {
            return Err(KinematicsError::Unreachable { arm });
        }
        let mut angle = atanf(-zj / denominator);
        if yj > y1 {
            angle += PI;
        }
        Ok(angle)
    }
}

/// Last valid pose of a delta mechanism
///
/// Updated from fresh joint angles each iteration. A failed forward solve
/// leaves both the angles and the position at their previous values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaMechanismState {
    pub geometry: DeltaGeometry,
    pub bounds: WorkspaceBounds,
    angles: [f32; 3],
    position: Vector3<f32>,
    valid: bool,
}

impl DeltaMechanismState {
    pub fn new(geometry: DeltaGeometry, bounds: WorkspaceBounds) -> Self {
        Self {
            geometry,
            bounds,
            angles: [0.0; 3],
            position: Vector3::zeros(),
            valid: false,
        }
    }

    /// Solve for `angles`; on failure the previous pose is kept
    pub fn update(&mut self, angles: [f32; 3]) -> Result<Vector3<f32>, KinematicsError> {
        let position = self.geometry.forward(angles)?;
        self.angles = angles;
        self.position = position;
        self.valid = true;
        Ok(position)
    }

    /// Joint angles of the last valid pose
    pub fn angles(&self) -> [f32; 3] {
        self.angles
    }

    /// End-effector position of the last valid pose
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Whether any solve has succeeded yet
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
