/// Errors from driver operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveError {
    /// Motor index beyond the output bank
    InvalidMotor(u8),
    /// Sensor or cue channel index out of range
    InvalidChannel(u8),
    /// The underlying duty output failed
    Output,
    /// The analog conversion failed
    Adc,
}
