//! Per-axis shared encoder counts

use portable_atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

use haptic_hal::InputPin;

use super::quadrature::{decode, EdgeOutcome, QuadratureState};

/// Maximum number of encoder axes (delta thumb plus two 2-DOF fingers)
pub const MAX_AXES: usize = 7;

/// One encoder axis
///
/// Written only from that axis's edge handler, read from the control loop.
#[derive(Debug)]
pub struct EncoderChannel {
    ticks: AtomicI32,
    previous: AtomicU8,
    changed: AtomicBool,
}

impl Default for EncoderChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderChannel {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicI32::new(0),
            previous: AtomicU8::new(0),
            changed: AtomicBool::new(false),
        }
    }

    /// Process one edge with the channel levels read after it
    pub fn on_edge(&self, a: bool, b: bool) -> EdgeOutcome {
        let next = QuadratureState::new(a, b);
        let prev = QuadratureState::from_bits(self.previous.load(Ordering::Relaxed));
        let outcome = decode(prev, next);
        let delta = outcome.delta();
        if delta != 0 {
            self.ticks.fetch_add(delta, Ordering::Release);
            self.changed.store(true, Ordering::Release);
        }
        self.previous.store(next.bits(), Ordering::Relaxed);
        outcome
    }

    /// Record the current levels without counting (call once at startup)
    pub fn seed(&self, a: bool, b: bool) {
        self.previous
            .store(QuadratureState::new(a, b).bits(), Ordering::Relaxed);
    }

    /// Signed tick count
    pub fn ticks(&self) -> i32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Read and clear the change flag
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Zero the count and clear the change flag
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Release);
        self.changed.store(false, Ordering::Release);
    }
}

/// All encoder axes of a device
///
/// Meant to live in a `static` shared by the edge handlers and the control
/// loop. Out-of-range axes read as zero and ignore edges.
#[derive(Debug)]
pub struct EncoderBank {
    channels: [EncoderChannel; MAX_AXES],
}

impl Default for EncoderBank {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderBank {
    pub const fn new() -> Self {
        Self {
            channels: [const { EncoderChannel::new() }; MAX_AXES],
        }
    }

    /// Channel for `axis`, if it exists
    pub fn channel(&self, axis: usize) -> Option<&EncoderChannel> {
        self.channels.get(axis)
    }

    /// Edge handler entry point
    pub fn on_edge(&self, axis: usize, a: bool, b: bool) -> EdgeOutcome {
        match self.channels.get(axis) {
            Some(channel) => channel.on_edge(a, b),
            None => EdgeOutcome::Invalid,
        }
    }

    /// Edge handler entry point reading both channel pins
    pub fn on_pin_edge<P: InputPin>(&self, axis: usize, a: &P, b: &P) -> EdgeOutcome {
        self.on_edge(axis, a.is_high(), b.is_high())
    }

    /// Record the current pin levels of `axis` without counting
    pub fn seed_from_pins<P: InputPin>(&self, axis: usize, a: &P, b: &P) {
        self.seed(axis, a.is_high(), b.is_high());
    }

    /// Record starting levels for `axis`
    pub fn seed(&self, axis: usize, a: bool, b: bool) {
        if let Some(channel) = self.channels.get(axis) {
            channel.seed(a, b);
        }
    }

    /// Tick count of `axis`
    pub fn get_ticks(&self, axis: usize) -> i32 {
        self.channels.get(axis).map_or(0, EncoderChannel::ticks)
    }

    /// Tick counts of every axis
    pub fn snapshot(&self) -> [i32; MAX_AXES] {
        let mut ticks = [0; MAX_AXES];
        for (out, channel) in ticks.iter_mut().zip(self.channels.iter()) {
            *out = channel.ticks();
        }
        ticks
    }

    /// Read and clear the change flag of `axis`
    pub fn take_changed(&self, axis: usize) -> bool {
        self.channels
            .get(axis)
            .is_some_and(EncoderChannel::take_changed)
    }

    /// Zero `axis`
    pub fn reset(&self, axis: usize) {
        if let Some(channel) = self.channels.get(axis) {
            channel.reset();
        }
    }
}
