//! Hardware driver implementations
//!
//! This crate provides concrete implementations on top of the
//! `haptic-hal` traits:
//!
//! - Torque motors: torque to signed duty through a fixed gain, the
//!   actuator the control loop drives
//! - Vibration motors: amplitude-controlled cue motors
//! - Force-sensitive resistors: raw 12-bit samples with optional
//!   calibration to newtons

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

mod error;
pub mod motor;
pub mod sensor;

pub use error::DriveError;
