//! Analog sample source

/// Full-scale value of a 12-bit conversion
pub const ADC_MAX: u16 = 4095;

/// Analog input with numbered channels
pub trait AnalogInput {
    /// Error type for conversions
    type Error;

    /// Take one 12-bit sample from `channel`
    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error>;
}
