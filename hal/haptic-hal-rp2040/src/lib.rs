//! RP2040-specific HAL for the haptic firmware
//!
//! This crate provides RP2040 implementations of the shared `haptic-hal`
//! traits on top of embassy-rp:
//!
//! - Monotonic clock from the embassy time driver
//! - Encoder channel inputs with async edge waits
//! - PWM motor bank with direction pins
//! - Blocking ADC channels for the force sensors
//! - Buffered UART transmit to the host

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod clock;
pub mod gpio;
pub mod motor;
pub mod uart;

pub use adc::{AdcInputError, AdcInputs};
pub use clock::EmbassyClock;
pub use gpio::{EncoderInput, QuadraturePins};
pub use motor::{MotorChannel, PwmMotorBank, PwmMotorError};
pub use uart::HostTx;
