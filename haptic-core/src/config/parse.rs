//! Minimal TOML parser for `device.toml`
//!
//! Handles only the subset the device configuration uses. It does NOT
//! support the full TOML grammar and needs no allocator.
//!
//! Supported features:
//! - `[section]` and dotted `[section.subsection]` headers
//! - Key = value pairs (float, integer, boolean, string)
//! - Three-element float arrays: `center = [0.0, 0.0, 35.0]`
//! - Comments (`# ...`), whole-line or trailing
//!
//! The environment model is chosen by its section name, e.g.
//! `[environment.rigid_sphere]`, or by `environment = "none"` before the
//! first section. Omitted keys keep their defaults.

use crate::environment::{
    Axis, BumpValley, Damping, ForceModel, Friction, HardSurface, MassSpringDamper, RigidSphere,
    Spring, Teleoperation, Texture, Wall, WallSide,
};

use super::types::{DeviceConfig, Topology, ValidationError};

/// Why `device.toml` was rejected
///
/// Line numbers are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Malformed or unknown section header
    InvalidSection { line: u32 },
    /// Key not known in the current section
    UnknownKey { line: u32 },
    /// Value has the wrong type or is malformed
    InvalidValue { line: u32 },
    /// Line is neither a header, a key/value pair nor a comment
    Syntax { line: u32 },
    /// Parsed, but a value is out of range
    Invalid(ValidationError),
}

impl From<ValidationError> for ConfigError {
    fn from(e: ValidationError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Rotary,
    Delta,
    Workspace,
    Fsr,
    Environment,
    /// `[environment.hard_surface.wall]`
    EnvironmentWall,
}

/// Line-level failure, tagged with the line number by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineError {
    Section,
    Key,
    Value,
}

impl LineError {
    fn at(self, line: u32) -> ConfigError {
        match self {
            LineError::Section => ConfigError::InvalidSection { line },
            LineError::Key => ConfigError::UnknownKey { line },
            LineError::Value => ConfigError::InvalidValue { line },
        }
    }
}

/// Parse and validate a device configuration
pub fn parse_device_config(input: &str) -> Result<DeviceConfig, ConfigError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line_no = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') || line.len() < 3 {
                return Err(ConfigError::InvalidSection { line: line_no });
            }
            section = open_section(&line[1..line.len() - 1], &mut config)
                .map_err(|e| e.at(line_no))?;
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            return Err(ConfigError::Syntax { line: line_no });
        };
        apply_value(section, key, value, &mut config).map_err(|e| e.at(line_no))?;
    }

    config.validate()?;
    Ok(config)
}

/// Switch to a new section, creating the environment model it names
fn open_section(header: &str, config: &mut DeviceConfig) -> Result<Section, LineError> {
    let header = header.trim();
    let mut parts = header.split('.').map(str::trim);
    let first = parts.next().ok_or(LineError::Section)?;
    let second = parts.next();
    let third = parts.next();
    if parts.next().is_some() {
        return Err(LineError::Section);
    }

    match (first, second, third) {
        ("device", None, None) => Ok(Section::Device),
        ("rotary", None, None) => Ok(Section::Rotary),
        ("delta", None, None) => Ok(Section::Delta),
        ("workspace", None, None) => Ok(Section::Workspace),
        ("fsr", None, None) => Ok(Section::Fsr),
        ("environment", Some("hard_surface"), Some("wall")) => {
            if !matches!(config.environment, ForceModel::HardSurface(_)) {
                config.environment = ForceModel::HardSurface(HardSurface::default());
            }
            Ok(Section::EnvironmentWall)
        }
        ("environment", Some(name), None) => {
            // Re-opening the active model keeps keys already applied
            let model = model_by_name(name).ok_or(LineError::Section)?;
            if model.name() != config.environment.name() {
                config.environment = model;
            }
            Ok(Section::Environment)
        }
        _ => Err(LineError::Section),
    }
}

/// Default instance of the model called `name`
fn model_by_name(name: &str) -> Option<ForceModel> {
    Some(match name {
        "none" => ForceModel::None,
        "spring" => ForceModel::Spring(Spring::default()),
        "wall" => ForceModel::Wall(Wall::default()),
        "damping" => ForceModel::Damping(Damping::default()),
        "friction" => ForceModel::Friction(Friction::default()),
        "hard_surface" => ForceModel::HardSurface(HardSurface::default()),
        "bump_valley" => ForceModel::BumpValley(BumpValley::default()),
        "texture" => ForceModel::Texture(Texture::default()),
        "mass_spring_damper" => ForceModel::MassSpringDamper(MassSpringDamper::default()),
        "teleoperation" => ForceModel::Teleoperation(Teleoperation::default()),
        "rigid_sphere" => ForceModel::RigidSphere(RigidSphere::default()),
        _ => return None,
    })
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, LineError> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(LineError::Value)
    }
}

fn parse_float(value: &str) -> Result<f32, LineError> {
    let parsed: f32 = strip_underscores(value)
        .parse()
        .map_err(|_| LineError::Value)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(LineError::Value)
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, LineError> {
    value.parse().map_err(|_| LineError::Value)
}

fn parse_bool(value: &str) -> Result<bool, LineError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LineError::Value),
    }
}

/// Parse `[a, b, c]`
fn parse_vec3(value: &str) -> Result<[f32; 3], LineError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(LineError::Value)?;
    let mut out = [0.0f32; 3];
    let mut count = 0;
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = out.get_mut(count).ok_or(LineError::Value)?;
        *slot = parse_float(item)?;
        count += 1;
    }
    if count == 3 {
        Ok(out)
    } else {
        Err(LineError::Value)
    }
}

fn parse_topology(value: &str) -> Result<Topology, LineError> {
    match parse_string(value)? {
        "linear" => Ok(Topology::Linear),
        "planar" => Ok(Topology::Planar),
        "delta" => Ok(Topology::Delta),
        "hand" => Ok(Topology::Hand),
        _ => Err(LineError::Value),
    }
}

fn parse_axis(value: &str) -> Result<Axis, LineError> {
    match parse_string(value)? {
        "x" => Ok(Axis::X),
        "y" => Ok(Axis::Y),
        "z" => Ok(Axis::Z),
        _ => Err(LineError::Value),
    }
}

fn parse_side(value: &str) -> Result<WallSide, LineError> {
    match parse_string(value)? {
        "above" => Ok(WallSide::Above),
        "below" => Ok(WallSide::Below),
        _ => Err(LineError::Value),
    }
}

/// Remove TOML digit separators (`1_000`)
fn strip_underscores(value: &str) -> heapless::String<32> {
    let mut out = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        // Over-long literals come back empty and fail to parse
        if out.push(c).is_err() {
            out.clear();
            break;
        }
    }
    out
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
) -> Result<(), LineError> {
    match section {
        Section::Root => match key {
            "environment" => {
                config.environment = model_by_name(parse_string(value)?).ok_or(LineError::Value)?;
            }
            _ => return Err(LineError::Key),
        },
        Section::Device => {
            let device = &mut config.device;
            match key {
                "topology" => device.topology = parse_topology(value)?,
                "counts_per_rev" => device.counts_per_rev = parse_int(value)?,
                "torque_to_duty" => device.torque_to_duty = parse_float(value)?,
                _ => return Err(LineError::Key),
            }
        }
        Section::Rotary => {
            let r = &mut config.rotary;
            let field = match key {
                "r_ma" => &mut r.r_ma,
                "r_a" => &mut r.r_a,
                "r_ha" => &mut r.r_ha,
                "r_mb" => &mut r.r_mb,
                "r_b" => &mut r.r_b,
                "l_a" => &mut r.l_a,
                "l_b" => &mut r.l_b,
                "delta_a" => &mut r.delta_a,
                "delta_b" => &mut r.delta_b,
                "offset_a" => &mut r.offset_a,
                "offset_b" => &mut r.offset_b,
                "cx" => &mut r.cx,
                "cy" => &mut r.cy,
                _ => return Err(LineError::Key),
            };
            *field = parse_float(value)?;
        }
        Section::Delta => {
            let d = &mut config.delta;
            let field = match key {
                "e" => &mut d.e,
                "f" => &mut d.f,
                "re" => &mut d.re,
                "rf" => &mut d.rf,
                _ => return Err(LineError::Key),
            };
            *field = parse_float(value)?;
        }
        Section::Workspace => {
            let w = &mut config.workspace;
            let field = match key {
                "r_max" => &mut w.r_max,
                "z_min" => &mut w.z_min,
                "z_max" => &mut w.z_max,
                _ => return Err(LineError::Key),
            };
            *field = parse_float(value)?;
        }
        Section::Fsr => match key {
            "enabled" => config.fsr.enabled = parse_bool(value)?,
            "newtons_per_count" => config.fsr.newtons_per_count = parse_float(value)?,
            "zero_offset" => config.fsr.zero_offset = parse_int(value)?,
            _ => return Err(LineError::Key),
        },
        Section::Environment => apply_model_value(&mut config.environment, key, value)?,
        Section::EnvironmentWall => match &mut config.environment {
            ForceModel::HardSurface(model) => apply_wall_value(&mut model.wall, key, value)?,
            _ => return Err(LineError::Section),
        },
    }
    Ok(())
}

fn apply_wall_value(wall: &mut Wall, key: &str, value: &str) -> Result<(), LineError> {
    match key {
        "axis" => wall.axis = parse_axis(value)?,
        "side" => wall.side = parse_side(value)?,
        "position" => wall.position = parse_float(value)?,
        "stiffness" => wall.stiffness = parse_float(value)?,
        "damping" => wall.damping = parse_float(value)?,
        _ => return Err(LineError::Key),
    }
    Ok(())
}

fn apply_model_value(model: &mut ForceModel, key: &str, value: &str) -> Result<(), LineError> {
    match model {
        ForceModel::None => return Err(LineError::Key),
        ForceModel::Spring(m) => match key {
            "stiffness" => m.stiffness = parse_float(value)?,
            "rest" => m.rest = parse_vec3(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::Wall(m) => apply_wall_value(m, key, value)?,
        ForceModel::Damping(m) => match key {
            "coefficient" => m.coefficient = parse_float(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::Friction(m) => {
            let field = match key {
                "static_force" => &mut m.static_force,
                "coulomb_force" => &mut m.coulomb_force,
                "viscous" => &mut m.viscous,
                "stick_velocity" => &mut m.stick_velocity,
                _ => return Err(LineError::Key),
            };
            *field = parse_float(value)?;
        }
        ForceModel::HardSurface(m) => {
            let field = match key {
                "amplitude" => &mut m.amplitude,
                "decay" => &mut m.decay,
                "frequency" => &mut m.frequency,
                _ => return Err(LineError::Key),
            };
            *field = parse_float(value)?;
        }
        ForceModel::BumpValley(m) => match key {
            "axis" => m.axis = parse_axis(value)?,
            "amplitude" => m.amplitude = parse_float(value)?,
            "center" => m.center = parse_float(value)?,
            "width" => m.width = parse_float(value)?,
            "period" => m.period = parse_float(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::Texture(m) => match key {
            "axis" => m.axis = parse_axis(value)?,
            "amplitude" => m.amplitude = parse_float(value)?,
            "period" => m.period = parse_float(value)?,
            "damping" => m.damping = parse_float(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::MassSpringDamper(m) => match key {
            "mass" => m.mass = parse_float(value)?,
            "stiffness" => m.stiffness = parse_float(value)?,
            "damping" => m.damping = parse_float(value)?,
            "coupling" => m.coupling = parse_float(value)?,
            "rest" => m.rest = parse_vec3(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::Teleoperation(m) => match key {
            "stiffness" => m.stiffness = parse_float(value)?,
            "damping" => m.damping = parse_float(value)?,
            _ => return Err(LineError::Key),
        },
        ForceModel::RigidSphere(m) => match key {
            "center" => m.center = parse_vec3(value)?,
            "radius" => m.radius = parse_float(value)?,
            "stiffness" => m.stiffness = parse_float(value)?,
            _ => return Err(LineError::Key),
        },
    }
    Ok(())
}
