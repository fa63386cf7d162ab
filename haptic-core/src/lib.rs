//! Board-agnostic control core for desktop haptic devices
//!
//! This crate contains everything between the encoder edges and the motor
//! duty that does not depend on a specific chip:
//!
//! - Quadrature decoding into shared per-axis counts
//! - Kinematics for 1-DOF, 2-DOF, delta and hand linkages
//! - Force to motor torque mapping
//! - Virtual environment models
//! - The real-time control loop
//! - Device configuration types and the embedded TOML reader

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod control;
pub mod encoder;
pub mod environment;
pub mod jacobian;
pub mod kinematics;
