//! Configuration type definitions
//!
//! These types describe one device build. The firmware embeds a
//! `device.toml` and parses it into a [`DeviceConfig`] at startup; the
//! build script deserializes the same file with serde to validate it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::environment::ForceModel;
use crate::kinematics::{DeltaGeometry, RotaryGeometry, WorkspaceBounds, DEFAULT_COUNTS_PER_REV};
use haptic_protocol::TeleopLayout;

/// Default torque (N·m) to duty fraction gain
pub const DEFAULT_TORQUE_TO_DUTY: f32 = 65.13;

/// Mechanical arrangement of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Topology {
    /// 1-DOF sector pulley, motor 1
    #[default]
    Linear,
    /// 2-DOF two-link arm, motors 1 and 2
    Planar,
    /// 3-arm delta mechanism, motors 1 to 3
    Delta,
    /// Delta thumb on motors 1 to 3, fingers on motors 4-5 and 6-7
    Hand,
}

impl Topology {
    /// Motors (and encoder axes) used
    pub const fn motor_count(self) -> usize {
        match self {
            Topology::Linear => 1,
            Topology::Planar => 2,
            Topology::Delta => 3,
            Topology::Hand => 7,
        }
    }

    /// Points checked against the environment
    pub const fn tracked_points(self) -> usize {
        match self {
            Topology::Hand => 3,
            _ => 1,
        }
    }

    /// Packed position layout exchanged with a teleoperation partner
    pub const fn teleop_layout(self) -> TeleopLayout {
        match self {
            Topology::Linear => TeleopLayout::Linear,
            _ => TeleopLayout::Planar,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Planar => "planar",
            Topology::Delta => "delta",
            Topology::Hand => "hand",
        }
    }
}

/// Device-wide settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceSettings {
    pub topology: Topology,
    /// Encoder counts per motor revolution
    pub counts_per_rev: u32,
    /// Duty fraction per N·m of motor torque
    pub torque_to_duty: f32,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            topology: Topology::Linear,
            counts_per_rev: DEFAULT_COUNTS_PER_REV,
            torque_to_duty: DEFAULT_TORQUE_TO_DUTY,
        }
    }
}

/// Force-sensitive resistor calibration
///
/// `newtons = (raw − zero_offset) · newtons_per_count`, clamped at zero. A
/// zero gain reports raw counts only.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FsrConfig {
    /// Read the sensors each iteration
    pub enabled: bool,
    pub newtons_per_count: f32,
    pub zero_offset: u16,
}

impl Default for FsrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            newtons_per_count: 0.0,
            zero_offset: 0,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    pub device: DeviceSettings,
    pub rotary: RotaryGeometry,
    pub delta: DeltaGeometry,
    pub workspace: WorkspaceBounds,
    pub fsr: FsrConfig,
    pub environment: ForceModel,
}

/// A configuration value outside its physical range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Encoder resolution of zero
    CountsPerRev,
    /// A pulley radius or link length is not positive
    RotaryGeometry,
    /// A delta dimension is not positive
    DeltaGeometry,
    /// Workspace radius not positive or `z_min >= z_max`
    Workspace,
    /// Torque gain negative or not finite
    TorqueToDuty,
}

impl DeviceConfig {
    /// Check physical ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device.counts_per_rev == 0 {
            return Err(ValidationError::CountsPerRev);
        }
        let gain = self.device.torque_to_duty;
        if !gain.is_finite() || gain < 0.0 {
            return Err(ValidationError::TorqueToDuty);
        }
        let r = &self.rotary;
        if [r.r_ma, r.r_a, r.r_ha, r.r_mb, r.r_b, r.l_a, r.l_b]
            .iter()
            .any(|&v| !(v > 0.0))
        {
            return Err(ValidationError::RotaryGeometry);
        }
        let d = &self.delta;
        if [d.e, d.f, d.re, d.rf].iter().any(|&v| !(v > 0.0)) {
            return Err(ValidationError::DeltaGeometry);
        }
        let w = &self.workspace;
        if !(w.r_max > 0.0) || !(w.z_min < w.z_max) {
            return Err(ValidationError::Workspace);
        }
        Ok(())
    }
}
