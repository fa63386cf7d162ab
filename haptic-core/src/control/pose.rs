//! Topology-specific pose solve and force mapping
//!
//! Motor numbering is zero-based here: the delta arms (or the single 1-DOF
//! or 2-DOF linkage) start at motor 0, the hand fingers use motors 3-4 and
//! 5-6.

use nalgebra::{Vector2, Vector3};

use crate::config::{DeviceConfig, Topology};
use crate::encoder::MAX_AXES;
use crate::environment::{ForceCommand, MAX_TRACKED_POINTS};
use crate::jacobian::{delta_jacobian, delta_joint_torque, linear_torque, motor_torque, planar_torque, TorqueCommand};
use crate::kinematics::{joint_angle, DeltaMechanismState, KinematicsError, PlanarPose, RotaryGeometry};

/// First motor of each hand finger
const FINGER_MOTORS: [usize; 2] = [3, 5];

/// Solved pose of every tracked point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Tracked point positions (mm); unused entries are zero
    pub points: [Vector3<f32>; MAX_TRACKED_POINTS],
    /// Number of valid entries in `points`
    pub count: usize,
    /// Linkage solutions needed for force mapping
    planar: [Option<PlanarPose>; 2],
    delta_angles: Option<[f32; 3]>,
}

impl Default for Pose {
    /// No tracked points
    fn default() -> Self {
        Self {
            points: [Vector3::zeros(); MAX_TRACKED_POINTS],
            count: 0,
            planar: [None; 2],
            delta_angles: None,
        }
    }
}

impl Pose {

    fn push(&mut self, point: Vector3<f32>) {
        if let Some(slot) = self.points.get_mut(self.count) {
            *slot = point;
            self.count += 1;
        }
    }

    /// Primary tracked point
    pub fn primary(&self) -> Vector3<f32> {
        self.points[0]
    }
}

/// Turns tick counts into a [`Pose`] and forces into motor torques
#[derive(Debug, Clone)]
pub struct PoseSolver {
    topology: Topology,
    counts_per_rev: u32,
    rotary: RotaryGeometry,
    delta: DeltaMechanismState,
}

impl PoseSolver {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            topology: config.device.topology,
            counts_per_rev: config.device.counts_per_rev,
            rotary: config.rotary,
            delta: DeltaMechanismState::new(config.delta, config.workspace),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Last valid delta state
    pub fn delta(&self) -> &DeltaMechanismState {
        &self.delta
    }

    fn motor_angle(&self, ticks: &[i32; MAX_AXES], motor: usize) -> f32 {
        joint_angle(ticks[motor], self.counts_per_rev)
    }

    /// Solve every tracked point from the current tick counts
    pub fn solve(&mut self, ticks: &[i32; MAX_AXES]) -> Result<Pose, KinematicsError> {
        let mut pose = Pose::default();
        match self.topology {
            Topology::Linear => {
                let x = self.rotary.linear_position(self.motor_angle(ticks, 0));
                pose.push(Vector3::new(x, 0.0, 0.0));
            }
            Topology::Planar => {
                let planar = self
                    .rotary
                    .planar_pose(self.motor_angle(ticks, 0), self.motor_angle(ticks, 1));
                pose.push(planar_point(&planar));
                pose.planar[0] = Some(planar);
            }
            Topology::Delta | Topology::Hand => {
                let angles = [0, 1, 2].map(|m| self.rotary.sector_angle(self.motor_angle(ticks, m)));
                let thumb = self.delta.update(angles)?;
                pose.push(thumb);
                pose.delta_angles = Some(angles);

                if self.topology == Topology::Hand {
                    for (finger, &first) in FINGER_MOTORS.iter().enumerate() {
                        // The second finger is mirrored
                        let sign = if finger == 0 { 1.0 } else { -1.0 };
                        let planar = self.rotary.planar_pose(
                            sign * self.motor_angle(ticks, first),
                            sign * self.motor_angle(ticks, first + 1),
                        );
                        pose.push(planar_point(&planar));
                        pose.planar[finger] = Some(planar);
                    }
                }
            }
        }
        Ok(pose)
    }

    /// Map the rendered forces of `pose` to motor torques
    pub fn torques(&self, pose: &Pose, command: &ForceCommand) -> Result<TorqueCommand, KinematicsError> {
        let mut torques = TorqueCommand::zero();
        match self.topology {
            Topology::Linear => {
                torques.set(0, linear_torque(&self.rotary, command.forces[0].x));
            }
            Topology::Planar => {
                if let Some(planar) = &pose.planar[0] {
                    let [m1, m2] = planar_torque(&self.rotary, planar, planar_force(&command.forces[0]));
                    torques.set(0, m1);
                    torques.set(1, m2);
                }
            }
            Topology::Delta | Topology::Hand => {
                if let Some(angles) = pose.delta_angles {
                    let jacobian = delta_jacobian(&self.delta.geometry, angles, &pose.points[0])?;
                    let joint = delta_joint_torque(&jacobian, &command.forces[0]);
                    for (motor, &tau) in joint.iter().enumerate() {
                        torques.set(motor, motor_torque(tau, self.rotary.ratio_a()));
                    }
                }
                if self.topology == Topology::Hand {
                    for (finger, &first) in FINGER_MOTORS.iter().enumerate() {
                        let Some(planar) = &pose.planar[finger] else {
                            continue;
                        };
                        let sign = if finger == 0 { 1.0 } else { -1.0 };
                        let force = planar_force(&command.forces[finger + 1]);
                        let [ma, mb] = planar_torque(&self.rotary, planar, force);
                        torques.set(first, sign * ma);
                        torques.set(first + 1, sign * mb);
                    }
                }
            }
        }
        Ok(torques)
    }
}

fn planar_point(pose: &PlanarPose) -> Vector3<f32> {
    Vector3::new(pose.position.x, pose.position.y, 0.0)
}

fn planar_force(force: &Vector3<f32>) -> Vector2<f32> {
    Vector2::new(force.x, force.y)
}
