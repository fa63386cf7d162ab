//! Force-sensitive resistors
//!
//! Two FSRs sit under the finger pads of the hand device. Each is read as a
//! raw 12-bit ADC sample; an optional linear calibration turns the sample
//! into newtons.

use haptic_core::config::FsrConfig;
use haptic_hal::analog::ADC_MAX;
use haptic_hal::AnalogInput;

use crate::DriveError;

/// Number of FSR inputs
pub const FSR_CHANNELS: usize = 2;

/// One FSR sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FsrReading {
    /// 12-bit sample
    pub raw: u16,
    /// Calibrated force, when a calibration gain is configured
    pub newtons: Option<f32>,
}

/// FSR pair on two ADC channels
pub struct Fsr<A> {
    adc: A,
    channels: [u8; FSR_CHANNELS],
    calibration: FsrConfig,
}

impl<A: AnalogInput> Fsr<A> {
    /// Create a reader for the FSRs on ADC `channels`
    pub fn new(adc: A, channels: [u8; FSR_CHANNELS], calibration: FsrConfig) -> Self {
        Self {
            adc,
            channels,
            calibration,
        }
    }

    /// Raw sample of sensor `index`
    pub fn read_raw(&mut self, index: u8) -> Result<u16, DriveError> {
        let channel = *self
            .channels
            .get(index as usize)
            .ok_or(DriveError::InvalidChannel(index))?;
        let raw = self
            .adc
            .read_channel(channel)
            .map_err(|_| DriveError::Adc)?;
        Ok(raw.min(ADC_MAX))
    }

    /// Sample and calibrate sensor `index`
    pub fn read(&mut self, index: u8) -> Result<FsrReading, DriveError> {
        let raw = self.read_raw(index)?;
        Ok(FsrReading {
            raw,
            newtons: self.to_newtons(raw),
        })
    }

    /// Sample both sensors
    pub fn read_all(&mut self) -> Result<[FsrReading; FSR_CHANNELS], DriveError> {
        Ok([self.read(0)?, self.read(1)?])
    }

    /// Force for `raw`, clamped at zero; `None` without a calibration gain
    pub fn to_newtons(&self, raw: u16) -> Option<f32> {
        let gain = self.calibration.newtons_per_count;
        if !(gain > 0.0) {
            return None;
        }
        let counts = raw.saturating_sub(self.calibration.zero_offset);
        Some(f32::from(counts) * gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed sample per channel
    struct MockAdc {
        samples: [u16; 4],
    }

    impl AnalogInput for MockAdc {
        type Error = ();

        fn read_channel(&mut self, channel: u8) -> Result<u16, ()> {
            self.samples.get(channel as usize).copied().ok_or(())
        }
    }

    fn fsr(calibration: FsrConfig) -> Fsr<MockAdc> {
        Fsr::new(
            MockAdc {
                samples: [0, 1200, 5000, 300],
            },
            [1, 3],
            calibration,
        )
    }

    #[test]
    fn test_raw_reads_mapped_channels() {
        let mut fsr = fsr(FsrConfig::default());
        assert_eq!(fsr.read_raw(0), Ok(1200));
        assert_eq!(fsr.read_raw(1), Ok(300));
        assert_eq!(fsr.read_raw(2), Err(DriveError::InvalidChannel(2)));
    }

    #[test]
    fn test_uncalibrated_has_no_force() {
        let mut fsr = fsr(FsrConfig::default());
        let reading = fsr.read(0).unwrap();
        assert_eq!(reading.raw, 1200);
        assert_eq!(reading.newtons, None);
    }

    #[test]
    fn test_calibration_subtracts_offset_and_clamps() {
        let mut fsr = fsr(FsrConfig {
            enabled: true,
            newtons_per_count: 0.01,
            zero_offset: 400,
        });
        let [first, second] = fsr.read_all().unwrap();
        assert!((first.newtons.unwrap() - 8.0).abs() < 1e-4);
        assert_eq!(second.newtons, Some(0.0));
    }

    #[test]
    fn test_out_of_range_sample_is_clamped() {
        let mut fsr = Fsr::new(
            MockAdc {
                samples: [0, 0, 5000, 0],
            },
            [2, 0],
            FsrConfig::default(),
        );
        assert_eq!(fsr.read_raw(0), Ok(ADC_MAX));
    }

    #[test]
    fn test_adc_failure() {
        let mut fsr = Fsr::new(MockAdc { samples: [0; 4] }, [7, 0], FsrConfig::default());
        assert_eq!(fsr.read_raw(0), Err(DriveError::Adc));
    }
}
