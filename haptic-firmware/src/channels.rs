//! Inter-task shared state
//!
//! Encoder counts and protocol flags are lock-free and written from
//! several tasks; everything else crosses tasks through embassy-sync
//! channels and signals.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use haptic_core::encoder::EncoderBank;
use haptic_protocol::{MotorOverride, ProtocolState};

/// Tick counts, written by the encoder tasks, read by the control loop
pub static ENCODERS: EncoderBank = EncoderBank::new();

/// Host request flags and the latest teleoperation position
pub static PROTOCOL: ProtocolState = ProtocolState::new();

/// Channel capacity for motor overrides; one 64-byte read holds up to 21
const OVERRIDE_CHANNEL_SIZE: usize = 24;

/// Motor overrides from the host, in arrival order (sent by serial RX)
pub static MOTOR_OVERRIDE: Channel<CriticalSectionRawMutex, MotorOverride, OVERRIDE_CHANNEL_SIZE> =
    Channel::new();

/// Contact cue (updated by the control loop when the handle touches or
/// leaves the virtual object)
pub static CONTACT: Signal<CriticalSectionRawMutex, bool> = Signal::new();
