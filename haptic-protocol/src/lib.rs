//! Host Synchronization Protocol
//!
//! This crate defines the byte-oriented serial protocol between the haptic
//! device and the host program (a visualizer, or a second device during
//! teleoperation). There is no CRC and no framing header: the leading byte
//! selects a fixed payload length.
//!
//! # Protocol Overview
//!
//! ```text
//! Host → Device
//! ┌──────┬──────────────────────┬─────────────────────────────────┐
//! │ '1'  │ -                    │ acknowledge                     │
//! │ '2'  │ -                    │ ping                            │
//! │ '3'  │ -                    │ request telemetry               │
//! │ 'm'  │ id, level            │ direct motor override           │
//! │ 'p'  │ u16 BE × 1 or 2      │ teleoperation position          │
//! │ 't'  │ -                    │ teleoperation ping              │
//! │ else │ ... 'l'              │ opaque, counted only            │
//! └──────┴──────────────────────┴─────────────────────────────────┘
//!
//! Device → Host
//!   ASCII:  f32 '\t' f32 '\t' ... ' ' 'l'
//!   Teleop: 'p' hi lo [hi lo] 'l'
//! ```
//!
//! The receive side only ever *sets* flags in [`ProtocolState`]; the control
//! loop consumes and clears them. Telemetry therefore goes out at most once
//! per acknowledge/request pair.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod message;
pub mod packed;
pub mod state;
pub mod telemetry;

pub use message::{
    Message, MessageParser, MotorOverride, TeleopLayout, MAX_BLOB_LEN, TERMINATOR,
};
pub use packed::{pack_position, unpack_position};
pub use state::{ProtocolState, RemotePosition};
pub use telemetry::{TelemetryBuffer, TelemetryError};
