//! Quadrature encoder decoding
//!
//! Each motor axis has two phase-offset channels. The edge handler for an
//! axis reads both levels and hands them to [`EncoderBank::on_edge`]; the
//! control loop reads the resulting counts with [`EncoderBank::get_ticks`].
//!
//! Counts live in atomics, one writer (the axis's edge handler) and one
//! reader (the control loop) per axis. Two transitions between edge
//! notifications lose a count; nothing detects it.

pub mod bank;
pub mod quadrature;

pub use bank::{EncoderBank, EncoderChannel, MAX_AXES};
pub use quadrature::{decode, EdgeOutcome, QuadratureState};
