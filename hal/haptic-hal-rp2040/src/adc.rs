//! Blocking ADC channels
//!
//! RP2040 has a single ADC with 4 external channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//!
//! A conversion takes about 2 µs, short enough to run blocking from the
//! sensor task.

use embassy_rp::adc::{Adc, Blocking, Channel, Error};
use haptic_hal::AnalogInput;

/// Fixed set of ADC channels read through one converter
///
/// `read_channel(n)` samples the `n`-th channel handed to [`AdcInputs::new`].
pub struct AdcInputs<'d, const N: usize> {
    adc: Adc<'d, Blocking>,
    channels: [Channel<'d>; N],
}

/// Errors from [`AdcInputs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcInputError {
    /// Channel index beyond the configured set
    NoChannel(u8),
    /// The conversion failed
    Conversion,
}

impl From<Error> for AdcInputError {
    fn from(_: Error) -> Self {
        AdcInputError::Conversion
    }
}

impl<'d, const N: usize> AdcInputs<'d, N> {
    pub fn new(adc: Adc<'d, Blocking>, channels: [Channel<'d>; N]) -> Self {
        Self { adc, channels }
    }
}

impl<const N: usize> AnalogInput for AdcInputs<'_, N> {
    type Error = AdcInputError;

    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error> {
        let input = self
            .channels
            .get_mut(channel as usize)
            .ok_or(AdcInputError::NoChannel(channel))?;
        Ok(self.adc.blocking_read(input)?)
    }
}
