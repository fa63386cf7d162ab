//! Monotonic clock from the embassy time driver

use embassy_time::Instant;
use haptic_hal::Clock;

/// [`Clock`] backed by `embassy_time::Instant`
///
/// Requires the `time-driver` feature of embassy-rp, which runs the
/// timer at 1 MHz.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
