//! Sensor driver implementations

pub mod fsr;

pub use fsr::{Fsr, FsrReading, FSR_CHANNELS};
