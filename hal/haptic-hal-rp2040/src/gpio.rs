//! Encoder channel inputs
//!
//! Each encoder axis uses two GPIO inputs. The firmware's edge task awaits
//! an edge on either channel, then reads both levels.

use embassy_futures::select::select;
use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::Peri;
use haptic_hal::InputPin;

/// One encoder channel
pub struct EncoderInput<'d> {
    input: Input<'d>,
}

impl<'d> EncoderInput<'d> {
    /// Configure `pin` as an input with pull-up (open-collector encoders)
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            input: Input::new(pin, Pull::Up),
        }
    }

    /// Wait for a rising or falling edge
    pub async fn wait_for_any_edge(&mut self) {
        self.input.wait_for_any_edge().await;
    }
}

impl InputPin for EncoderInput<'_> {
    fn is_high(&self) -> bool {
        self.input.is_high()
    }
}

/// Both channels of one encoder axis
pub struct QuadraturePins<'d> {
    pub a: EncoderInput<'d>,
    pub b: EncoderInput<'d>,
}

impl<'d> QuadraturePins<'d> {
    pub fn new(a: Peri<'d, impl Pin>, b: Peri<'d, impl Pin>) -> Self {
        Self {
            a: EncoderInput::new(a),
            b: EncoderInput::new(b),
        }
    }

    /// Wait for an edge on either channel
    pub async fn wait_for_edge(&mut self) {
        select(self.a.wait_for_any_edge(), self.b.wait_for_any_edge()).await;
    }
}
