//! Capstan-driven rotary linkages
//!
//! The 1-DOF device is a sector pulley turned by a small motor capstan; the
//! handle sits at radius `R_HA` on the sector. The 2-DOF device stacks two
//! such drives into a two-link arm whose second link is coupled to the first
//! through the pulley on link A.

use libm::{cosf, sinf};
use nalgebra::{Matrix2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pulley radii, link lengths and angle offsets of a rotary linkage
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RotaryGeometry {
    /// Motor A capstan radius (mm)
    pub r_ma: f32,
    /// Sector A radius (mm)
    pub r_a: f32,
    /// Handle radius on sector A (mm)
    pub r_ha: f32,
    /// Motor B capstan radius (mm)
    pub r_mb: f32,
    /// Sector B radius (mm)
    pub r_b: f32,
    /// Link A length (mm)
    pub l_a: f32,
    /// Link B length (mm)
    pub l_b: f32,
    /// Mounting angle of link A (rad)
    pub delta_a: f32,
    /// Mounting angle of link B (rad)
    pub delta_b: f32,
    /// Angle of link A at zero ticks (rad)
    pub offset_a: f32,
    /// Angle of link B at zero ticks (rad)
    pub offset_b: f32,
    /// Base pivot x (mm)
    pub cx: f32,
    /// Base pivot y (mm)
    pub cy: f32,
}

impl Default for RotaryGeometry {
    fn default() -> Self {
        Self {
            r_ma: 5.5,
            r_a: 35.0,
            r_ha: 59.0,
            r_mb: 5.5,
            r_b: 59.0,
            l_a: 65.0,
            l_b: 55.0,
            delta_a: 1.5708,
            delta_b: -1.10935,
            offset_a: 0.0,
            offset_b: 0.0,
            cx: 0.0,
            cy: 0.0,
        }
    }
}

/// Pose of a 2-DOF linkage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPose {
    /// End-effector position (mm)
    pub position: Vector2<f32>,
    /// Link angles including mounting offsets (rad)
    pub link_angles: [f32; 2],
    /// d(position)/d(link angle), mm/rad
    pub jacobian: Matrix2<f32>,
}

impl RotaryGeometry {
    /// Motor A to sector A reduction
    pub fn ratio_a(&self) -> f32 {
        self.r_ma / self.r_a
    }

    /// Coupling of sector A into sector B
    pub fn ratio_b(&self) -> f32 {
        self.r_mb / self.r_b
    }

    /// Sector angle from the motor angle
    pub fn sector_angle(&self, motor_angle: f32) -> f32 {
        -motor_angle * self.ratio_a()
    }

    /// Handle position of a 1-DOF device (mm along the handle arc)
    pub fn linear_position(&self, motor_angle: f32) -> f32 {
        -self.r_ha * self.sector_angle(motor_angle)
    }

    /// Solve a 2-DOF linkage from its two motor angles
    pub fn planar_pose(&self, motor_a: f32, motor_b: f32) -> PlanarPose {
        let theta_a = -self.ratio_a() * motor_a + self.offset_a;
        let theta_b = -self.ratio_a() * motor_b + self.ratio_b() * theta_a + self.offset_b;

        let ta = theta_a + self.delta_a;
        let tb = theta_b + self.delta_b;
        let (sin_a, cos_a) = (sinf(ta), cosf(ta));
        let (sin_ab, cos_ab) = (sinf(ta + tb), cosf(ta + tb));

        let px = -self.l_a * sin_a + self.cx;
        let py = self.l_a * cos_a + self.cy;
        let position = Vector2::new(-self.l_b * sin_ab + px, self.l_b * cos_ab + py);

        let jacobian = Matrix2::new(
            -self.l_b * cos_ab - self.l_a * cos_a,
            -self.l_b * cos_ab,
            -self.l_b * sin_ab - self.l_a * sin_a,
            -self.l_b * sin_ab,
        );

        PlanarPose {
            position,
            link_angles: [ta, tb],
            jacobian,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_linear_position_sign_and_scale() {
        let geometry = RotaryGeometry::default();
        // One motor revolution moves the handle 2π · 59 · 5.5/35 mm
        let x = geometry.linear_position(2.0 * PI);
        let expected = 2.0 * PI * 59.0 * 5.5 / 35.0;
        assert!((x - expected).abs() < 1e-3, "{}", x);
        assert_eq!(geometry.linear_position(0.0), 0.0);
    }

    #[test]
    fn test_planar_home_pose() {
        let geometry = RotaryGeometry::default();
        let pose = geometry.planar_pose(0.0, 0.0);
        let ta = 1.5708f32;
        let tb = -1.10935f32;
        let px = -65.0 * libm::sinf(ta);
        let py = 65.0 * libm::cosf(ta);
        assert!((pose.position.x - (-55.0 * libm::sinf(ta + tb) + px)).abs() < 1e-3);
        assert!((pose.position.y - (55.0 * libm::cosf(ta + tb) + py)).abs() < 1e-3);
        assert!((pose.link_angles[0] - ta).abs() < 1e-6);
    }

    #[test]
    fn test_planar_jacobian_matches_finite_difference() {
        let geometry = RotaryGeometry::default();
        let base = geometry.planar_pose(3.0, -2.0);
        // Turn link A by h while motor B cancels the coupling into link B
        let h = 1e-3f32;
        let dma = -h / geometry.ratio_a();
        let dmb = h * geometry.ratio_b() / geometry.ratio_a();
        let shifted = geometry.planar_pose(3.0 + dma, -2.0 + dmb);
        let dx = (shifted.position - base.position) / h;
        assert!((dx.x - base.jacobian[(0, 0)]).abs() < 0.2, "{} vs {}", dx.x, base.jacobian[(0, 0)]);
        assert!((dx.y - base.jacobian[(1, 0)]).abs() < 0.2, "{} vs {}", dx.y, base.jacobian[(1, 0)]);
    }

    #[test]
    fn test_cursor_offset_shifts_position() {
        let geometry = RotaryGeometry {
            cx: 10.0,
            cy: -5.0,
            ..RotaryGeometry::default()
        };
        let shifted = geometry.planar_pose(1.0, 1.0);
        let plain = RotaryGeometry::default().planar_pose(1.0, 1.0);
        assert!((shifted.position.x - plain.position.x - 10.0).abs() < 1e-4);
        assert!((shifted.position.y - plain.position.y + 5.0).abs() < 1e-4);
    }
}
