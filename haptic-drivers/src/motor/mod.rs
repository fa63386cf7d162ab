//! Motor driver implementations
//!
//! - Torque motors: the force-feedback motors of the linkage
//! - Vibration motors: on/off cue motors with an amplitude

pub mod torque;
pub mod vibration;

pub use torque::{torque_to_duty, TorqueMotorBank};
pub use vibration::{VibrationMotors, VIBRATION_CHANNELS};
