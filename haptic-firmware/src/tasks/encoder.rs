//! Encoder edge task
//!
//! One instance per axis. Each wakes on an edge of either channel and
//! pushes the new levels through the shared quadrature decoder.

use defmt::*;

use haptic_core::encoder::EdgeOutcome;
use haptic_hal_rp2040::QuadraturePins;

use crate::channels::ENCODERS;

/// One task per force-feedback axis on the board
#[embassy_executor::task(pool_size = 3)]
pub async fn encoder_task(axis: usize, mut pins: QuadraturePins<'static>) {
    ENCODERS.seed_from_pins(axis, &pins.a, &pins.b);
    info!("Encoder task started on axis {}", axis);

    let mut invalid: u32 = 0;
    loop {
        pins.wait_for_edge().await;
        if ENCODERS.on_pin_edge(axis, &pins.a, &pins.b) == EdgeOutcome::Invalid {
            // Both channels moved between samples, a step was lost
            invalid = invalid.wrapping_add(1);
            trace!("Axis {}: invalid transition ({} total)", axis, invalid);
        }
    }
}
