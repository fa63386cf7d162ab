//! Outbound telemetry encoding
//!
//! The host visualizer reads tab-separated ASCII floats closed by `" l"`.
//! A teleoperation partner reads packed positions instead:
//! `'p' hi lo [hi lo] 'l'`.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::message::{TeleopLayout, MSG_TELEOP_POSITION, TERMINATOR};
use crate::packed::pack_position_be;

/// Largest encoded frame (thirteen `%.2f` fields with room for wide values)
pub const MAX_TELEMETRY_LEN: usize = 192;

/// Number of fields in the hand telemetry frame
pub const HAND_FIELD_COUNT: usize = 13;

/// First field of the thumb position in the hand frame
pub const HAND_THUMB_FIELD: usize = 6;

/// One encoded telemetry frame
pub type TelemetryBuffer = Vec<u8, MAX_TELEMETRY_LEN>;

/// Errors that can occur while encoding telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Frame does not fit in [`MAX_TELEMETRY_LEN`]
    BufferFull,
}

/// 1-DOF frame: handle position and one model parameter
pub fn encode_linear(position: f32, parameter: f32) -> Result<TelemetryBuffer, TelemetryError> {
    encode_fields(&[position, parameter], 6)
}

/// 2-DOF frame: cursor, proxy and one model parameter
pub fn encode_planar(
    cursor: [f32; 2],
    proxy: [f32; 2],
    parameter: f32,
) -> Result<TelemetryBuffer, TelemetryError> {
    encode_fields(&[cursor[0], cursor[1], proxy[0], proxy[1], parameter], 6)
}

/// Delta frame: end-effector position
pub fn encode_spatial(position: [f32; 3]) -> Result<TelemetryBuffer, TelemetryError> {
    encode_fields(&position, 6)
}

/// Hand frame: thirteen fields, the thumb position in fields 7 to 9
///
/// The remaining fields are placeholders the visualizer expects.
pub fn encode_hand(thumb: [f32; 3]) -> Result<TelemetryBuffer, TelemetryError> {
    let mut fields = [0.0f32; HAND_FIELD_COUNT];
    fields[HAND_THUMB_FIELD..HAND_THUMB_FIELD + 3].copy_from_slice(&thumb);
    encode_fields(&fields, 2)
}

/// Teleoperation frame: packed local position for the partner device
///
/// Only the first `layout.field_count()` coordinates are sent.
pub fn encode_teleop(
    layout: TeleopLayout,
    position: [f32; 2],
) -> Result<TelemetryBuffer, TelemetryError> {
    let mut out = TelemetryBuffer::new();
    out.push(MSG_TELEOP_POSITION)
        .map_err(|_| TelemetryError::BufferFull)?;
    for &coordinate in position.iter().take(layout.field_count()) {
        out.extend_from_slice(&pack_position_be(coordinate, layout.offset()))
            .map_err(|_| TelemetryError::BufferFull)?;
    }
    out.push(TERMINATOR).map_err(|_| TelemetryError::BufferFull)?;
    Ok(out)
}

/// Write `fields` as `"f\tf\t...\t l"` with `precision` decimals
fn encode_fields(fields: &[f32], precision: usize) -> Result<TelemetryBuffer, TelemetryError> {
    let mut text = String::<MAX_TELEMETRY_LEN>::new();
    for value in fields {
        write!(text, "{:.*}\t", precision, value).map_err(|_| TelemetryError::BufferFull)?;
    }
    text.push_str(" l").map_err(|_| TelemetryError::BufferFull)?;
    Ok(text.into_bytes())
}
