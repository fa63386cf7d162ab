//! Device configuration
//!
//! [`DeviceConfig`] fixes the topology, geometry and active environment of
//! one build. [`parse_device_config`] reads it from the embedded TOML.

mod parse;
mod types;

pub use parse::{parse_device_config, ConfigError};
pub use types::{
    DeviceConfig, DeviceSettings, FsrConfig, Topology, ValidationError, DEFAULT_TORQUE_TO_DUTY,
};
