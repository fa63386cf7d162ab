//! Simulated mass coupled to the handle

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{EnvironmentInput, ForceCommand, MM_TO_M};

/// Mass-spring-damper driven by the operator through a coupling spring
///
/// The mass hangs on a spring to `rest` with viscous damping. A stiff
/// virtual spring joins it to the handle; the operator feels the reaction
/// of that coupling. The mass state advances by semi-implicit Euler each
/// render and is kept exactly between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MassSpringDamper {
    /// kg
    pub mass: f32,
    /// N/m, mass to rest
    pub stiffness: f32,
    /// N·s/m
    pub damping: f32,
    /// N/m, handle to mass
    pub coupling: f32,
    /// mm
    pub rest: [f32; 3],
    #[cfg_attr(feature = "serde", serde(skip))]
    state: MassState,
}

/// Position and velocity of the simulated mass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MassState {
    /// mm
    pub position: [f32; 3],
    /// mm/s
    pub velocity: [f32; 3],
    initialized: bool,
}

impl Default for MassState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            velocity: [0.0; 3],
            initialized: false,
        }
    }
}

impl Default for MassSpringDamper {
    fn default() -> Self {
        Self::new(0.05, 100.0, 0.5, 1000.0, [0.0; 3])
    }
}

impl MassSpringDamper {
    pub fn new(mass: f32, stiffness: f32, damping: f32, coupling: f32, rest: [f32; 3]) -> Self {
        Self {
            mass,
            stiffness,
            damping,
            coupling,
            rest,
            state: MassState::default(),
        }
    }

    pub fn state(&self) -> MassState {
        self.state
    }

    /// Put the mass back at rest
    pub fn reset(&mut self) {
        self.state = MassState::default();
    }

    pub fn render(&mut self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let rest = Vector3::from(self.rest);
        if !self.state.initialized {
            self.state.position = self.rest;
            self.state.velocity = [0.0; 3];
            self.state.initialized = true;
        }

        let mut x = Vector3::from(self.state.position);
        let mut v = Vector3::from(self.state.velocity);

        let coupling_force = (handle.position - x) * self.coupling * MM_TO_M;

        if self.mass > 0.0 && input.dt > 0.0 {
            let net = coupling_force - (x - rest) * self.stiffness * MM_TO_M - v * self.damping * MM_TO_M;
            // m/s² to mm/s²
            let acceleration = net / self.mass * 1000.0;
            v += acceleration * input.dt;
            x += v * input.dt;
        }

        self.state.position = x.into();
        self.state.velocity = v.into();

        ForceCommand::primary(-coupling_force, x).with_parameter(x.x)
    }
}
