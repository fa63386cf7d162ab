//! Rigid sphere explored from the outside

use libm::sqrtf;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EnvironmentInput, ForceCommand, MAX_TRACKED_POINTS, MM_TO_M};

/// Radial penalty force for every tracked point inside a sphere
///
/// `F = k·(R − d)·(p − c)/d` for `d < R`, zero otherwise. A point exactly at
/// the center is pushed along +z. With planar points (z = 0) and a center in
/// that plane this renders a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RigidSphere {
    /// mm
    pub center: [f32; 3],
    /// mm
    pub radius: f32,
    /// N/m
    pub stiffness: f32,
}

impl Default for RigidSphere {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0, 35.0],
            radius: 50.0,
            stiffness: 200.0,
        }
    }
}

impl RigidSphere {
    /// Force on a single point (N)
    pub fn force_at(&self, point: &Vector3<f32>) -> Vector3<f32> {
        let offset = point - Vector3::from(self.center);
        let distance = sqrtf(offset.dot(&offset));
        if distance >= self.radius {
            return Vector3::zeros();
        }
        let magnitude = self.stiffness * (self.radius - distance) * MM_TO_M;
        if distance <= f32::EPSILON {
            return Vector3::new(0.0, 0.0, magnitude);
        }
        offset * (magnitude / distance)
    }

    /// Closest point on the surface to `point`, or `point` itself outside
    pub fn project(&self, point: &Vector3<f32>) -> Vector3<f32> {
        let center = Vector3::from(self.center);
        let offset = point - center;
        let distance = offset.norm();
        if distance >= self.radius {
            *point
        } else if distance <= f32::EPSILON {
            center + Vector3::new(0.0, 0.0, self.radius)
        } else {
            center + offset * (self.radius / distance)
        }
    }

    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let primary = input.primary();
        let mut command = ForceCommand::free(self.project(&primary.position));
        for (force, point) in command
            .forces
            .iter_mut()
            .zip(input.points.iter().take(MAX_TRACKED_POINTS))
        {
            *force = self.force_at(&point.position);
        }
        command.with_parameter((self.radius - (primary.position - Vector3::from(self.center)).norm()).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::handle;
    use super::*;
    use proptest::prelude::*;

    fn sphere() -> RigidSphere {
        RigidSphere {
            center: [0.0, 0.0, 70.0],
            radius: 20.0,
            stiffness: 200.0,
        }
    }

    #[test]
    fn test_point_just_inside_below_center() {
        let force = sphere().force_at(&Vector3::new(0.0, 0.0, 69.0));
        // 19 mm deep, pushed radially outward (away from the center, -z)
        assert!(force.z != 0.0);
        assert!((force.z + 200.0 * 19.0 * 0.001).abs() < 1e-4);
        assert_eq!(force.x, 0.0);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn test_point_just_inside_above_center() {
        let force = sphere().force_at(&Vector3::new(0.0, 0.0, 71.0));
        assert!(force.z > 0.0);
    }

    #[test]
    fn test_point_outside_has_no_force() {
        assert_eq!(sphere().force_at(&Vector3::new(0.0, 0.0, 40.0)), Vector3::zeros());
        assert_eq!(sphere().force_at(&Vector3::new(0.0, 20.0, 70.0)), Vector3::zeros());
    }

    #[test]
    fn test_center_pushes_up() {
        let force = sphere().force_at(&Vector3::new(0.0, 0.0, 70.0));
        assert!((force.z - 200.0 * 20.0 * 0.001).abs() < 1e-5);
        assert!(force.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_every_tracked_point_is_evaluated() {
        let points = [
            handle([0.0, 0.0, 40.0], [0.0; 3]),
            handle([10.0, 0.0, 70.0], [0.0; 3]),
            handle([0.0, -5.0, 70.0], [0.0; 3]),
        ];
        let command = sphere().render(&EnvironmentInput::new(&points, 0.001));
        assert_eq!(command.forces[0], Vector3::zeros());
        assert!(command.forces[1].x > 0.0);
        assert!(command.forces[2].y < 0.0);
        assert_eq!(command.parameter, 0.0);
    }

    #[test]
    fn test_proxy_on_surface() {
        let points = [handle([5.0, 0.0, 70.0], [0.0; 3])];
        let command = sphere().render(&EnvironmentInput::new(&points, 0.001));
        assert!((command.proxy - Vector3::new(20.0, 0.0, 70.0)).norm() < 1e-4);
        assert!((command.parameter - 15.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_deeper_is_stronger(
            theta in 0.0f32..core::f32::consts::PI,
            phi in 0.0f32..core::f32::consts::TAU,
            d1 in 0.1f32..19.9,
            d2 in 0.1f32..19.9,
        ) {
            prop_assume!((d1 - d2).abs() > 0.01);
            let direction = Vector3::new(
                libm::sinf(theta) * libm::cosf(phi),
                libm::sinf(theta) * libm::sinf(phi),
                libm::cosf(theta),
            );
            let model = sphere();
            let center = Vector3::from(model.center);
            let f1 = model.force_at(&(center + direction * d1)).norm();
            let f2 = model.force_at(&(center + direction * d2)).norm();
            prop_assert!(f1 > 0.0 && f2 > 0.0);
            if d1 < d2 {
                prop_assert!(f1 > f2);
            } else {
                prop_assert!(f2 > f1);
            }
        }

        #[test]
        fn prop_zero_outside(
            theta in 0.0f32..core::f32::consts::PI,
            phi in 0.0f32..core::f32::consts::TAU,
            d in 20.0f32..500.0,
        ) {
            let direction = Vector3::new(
                libm::sinf(theta) * libm::cosf(phi),
                libm::sinf(theta) * libm::sinf(phi),
                libm::cosf(theta),
            );
            let model = sphere();
            let point = Vector3::from(model.center) + direction * (d + 0.01);
            prop_assert_eq!(model.force_at(&point), Vector3::zeros());
        }
    }
}
