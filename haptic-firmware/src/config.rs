//! Device configuration
//!
//! The configuration is compiled in from device.toml, already checked by
//! build.rs, and parsed again at boot with the no_std reader in
//! haptic-core.

use defmt::*;

use haptic_core::config::{parse_device_config, DeviceConfig};

/// Embedded configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Force-feedback motor slots on the board
pub const BOARD_MOTORS: usize = 3;

/// Parse the embedded configuration, falling back to defaults
///
/// The defaults describe a 1-DOF device with no force model, which keeps
/// the motors quiet on a board with an unexpected configuration.
pub fn load_config() -> DeviceConfig {
    let config = match parse_device_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("device.toml rejected: {:?}, using defaults", e);
            return DeviceConfig::default();
        }
    };

    let topology = config.device.topology;
    if topology.motor_count() > BOARD_MOTORS {
        error!(
            "{} topology needs {} motors, board drives {}; using defaults",
            topology.name(),
            topology.motor_count(),
            BOARD_MOTORS
        );
        return DeviceConfig::default();
    }

    info!(
        "Config: {} topology, {} counts/rev, gain {} duty/Nm, {} model",
        topology.name(),
        config.device.counts_per_rev,
        config.device.torque_to_duty,
        config.environment.name()
    );
    config
}
