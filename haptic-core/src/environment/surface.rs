//! Surface effects: hard contact transients, bumps and textures

use core::f32::consts::{PI, TAU};

use libm::{expf, fabsf, floorf, sinf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::wall::{Axis, Wall};
use super::{EnvironmentInput, ForceCommand, MM_TO_M};

/// Wall with a decaying vibration on impact
///
/// On the iteration the handle first enters the wall, the normal impact
/// speed is latched and a timer starts. While in contact the wall spring is
/// superimposed with `amplitude · v_impact · e^(−decay·t) · sin(2π·f·t)`.
/// Leaving the wall re-arms the transient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HardSurface {
    pub wall: Wall,
    /// N per m/s of impact speed
    pub amplitude: f32,
    /// 1/s
    pub decay: f32,
    /// Hz
    pub frequency: f32,
    #[cfg_attr(feature = "serde", serde(skip))]
    contact: ContactState,
}

/// Latched contact of a [`HardSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactState {
    pub in_contact: bool,
    /// Normal speed at contact onset (m/s)
    pub impact_speed: f32,
    /// Time since contact onset (s)
    pub elapsed: f32,
}

impl Default for HardSurface {
    fn default() -> Self {
        Self::new(Wall::default(), 2.0, 80.0, 150.0)
    }
}

impl HardSurface {
    pub fn new(wall: Wall, amplitude: f32, decay: f32, frequency: f32) -> Self {
        Self {
            wall,
            amplitude,
            decay,
            frequency,
            contact: ContactState::default(),
        }
    }

    pub fn contact(&self) -> ContactState {
        self.contact
    }

    pub fn reset(&mut self) {
        self.contact = ContactState::default();
    }

    /// Transient force at the current contact time (N)
    fn transient(&self) -> f32 {
        let t = self.contact.elapsed;
        self.amplitude * self.contact.impact_speed * expf(-self.decay * t) * sinf(TAU * self.frequency * t)
    }

    pub fn render(&mut self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let penetration = self.wall.penetration(&handle.position);
        let proxy = self.wall.project(&handle.position);

        if penetration <= 0.0 {
            self.contact.in_contact = false;
            return ForceCommand::free(proxy);
        }

        if self.contact.in_contact {
            self.contact.elapsed += input.dt.max(0.0);
        } else {
            let normal_speed = fabsf(handle.velocity[self.wall.axis.index()]) * MM_TO_M;
            self.contact = ContactState {
                in_contact: true,
                impact_speed: normal_speed,
                elapsed: 0.0,
            };
        }

        let magnitude = self.wall.contact_force(penetration, &handle.velocity) + self.transient();
        ForceCommand::primary(self.wall.normal() * magnitude, proxy).with_parameter(penetration)
    }
}

/// Bumps (positive amplitude) or valleys (negative amplitude) along an axis
///
/// Inside `|x − center| < width/2` the force is
/// `amplitude · sin(2π·(x − center)/width)`, zero elsewhere. With a positive
/// `period` the profile repeats every `period` mm on both sides of
/// `center`; zero renders a single bump or valley.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BumpValley {
    pub axis: Axis,
    /// N
    pub amplitude: f32,
    /// mm
    pub center: f32,
    /// mm
    pub width: f32,
    /// mm, 0 for a single feature
    pub period: f32,
}

impl Default for BumpValley {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            amplitude: 1.0,
            center: 0.0,
            width: 20.0,
            period: 40.0,
        }
    }
}

impl BumpValley {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        let mut offset = handle.position[self.axis.index()] - self.center;
        let mut width = self.width;
        if self.period > 0.0 {
            offset -= self.period * floorf(offset / self.period + 0.5);
            width = width.min(self.period);
        }
        if width <= 0.0 || fabsf(offset) >= width / 2.0 {
            return ForceCommand::free(handle.position);
        }
        let magnitude = self.amplitude * sinf(TAU * offset / width);
        ForceCommand::primary(self.axis.unit() * magnitude, handle.position)
    }
}

/// Periodic spatial texture with position-modulated damping
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Texture {
    pub axis: Axis,
    /// N
    pub amplitude: f32,
    /// mm
    pub period: f32,
    /// Peak damping, N·s/m
    pub damping: f32,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            amplitude: 0.5,
            period: 4.0,
            damping: 0.5,
        }
    }
}

impl Texture {
    pub fn render(&self, input: &EnvironmentInput<'_>) -> ForceCommand {
        let handle = input.primary();
        if self.period <= 0.0 {
            return ForceCommand::free(handle.position);
        }
        let index = self.axis.index();
        let x = handle.position[index];
        let velocity = handle.velocity[index];
        let ripple = -self.amplitude * sinf(TAU * x / self.period);
        let drag = -self.damping * fabsf(sinf(PI * x / self.period)) * velocity * MM_TO_M;
        ForceCommand::primary(self.axis.unit() * (ripple + drag), handle.position)
    }
}
