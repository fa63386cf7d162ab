//! Vibration cue and FSR sampling task
//!
//! Both vibration motors buzz while the handle is in contact with the
//! virtual object. When enabled, the finger-pad FSRs are sampled at a slow
//! fixed rate and logged.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use haptic_drivers::motor::{VibrationMotors, VIBRATION_CHANNELS};
use haptic_drivers::sensor::{Fsr, FSR_CHANNELS};
use haptic_hal_rp2040::{AdcInputs, PwmMotorBank};

use crate::channels::CONTACT;

/// Feedback task configuration
#[derive(Clone, Copy)]
pub struct FeedbackConfig {
    /// Sample the FSRs
    pub fsr_enabled: bool,
    /// Vibration amplitude while in contact
    pub cue_amplitude: f32,
    /// FSR sample period
    pub sample_period: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            fsr_enabled: false,
            cue_amplitude: 0.6,
            sample_period: Duration::from_millis(100),
        }
    }
}

#[embassy_executor::task]
pub async fn feedback_task(
    mut fsr: Fsr<AdcInputs<'static, FSR_CHANNELS>>,
    mut vibration: VibrationMotors<PwmMotorBank<'static, VIBRATION_CHANNELS>>,
    config: FeedbackConfig,
) {
    info!("Feedback task started (FSR sampling: {})", config.fsr_enabled);

    if let Err(e) = vibration.off_all() {
        warn!("Vibration off failed: {:?}", e);
    }

    let mut ticker = Ticker::every(config.sample_period);

    loop {
        match select(CONTACT.wait(), ticker.next()).await {
            Either::First(touching) => {
                let amplitude = if touching { config.cue_amplitude } else { 0.0 };
                for channel in 0..VIBRATION_CHANNELS as u8 {
                    if let Err(e) = vibration.set(channel, amplitude) {
                        warn!("Vibration channel {} failed: {:?}", channel, e);
                    }
                }
                debug!("Contact {}", if touching { "start" } else { "end" });
            }
            Either::Second(()) => {
                if !config.fsr_enabled {
                    continue;
                }
                match fsr.read_all() {
                    Ok(readings) => debug!("FSR: {:?}", readings),
                    Err(e) => warn!("FSR read failed: {:?}", e),
                }
            }
        }
    }
}
