//! Haptic Hardware Abstraction Layer
//!
//! This crate defines the contracts the control core needs from the board:
//! a monotonic clock, digital levels for the encoder channels, a signed duty
//! output per motor, a byte sink to the host and 12-bit analog samples.
//! Chip-specific crates implement them; tests implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  haptic-core / haptic-drivers           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  haptic-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  haptic-hal-  │       │  host mocks   │
//! │    rp2040     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`clock::Clock`] - Monotonic microsecond clock
//! - [`gpio::InputPin`] - Digital input levels
//! - [`motor::MotorOutput`] - Signed duty-cycle command per motor
//! - [`uart::UartTx`] - Serial transmit
//! - [`analog::AnalogInput`] - 12-bit analog samples

#![no_std]
#![deny(unsafe_code)]

pub mod analog;
pub mod clock;
pub mod gpio;
pub mod motor;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use analog::AnalogInput;
pub use clock::Clock;
pub use gpio::InputPin;
pub use motor::MotorOutput;
pub use uart::UartTx;
