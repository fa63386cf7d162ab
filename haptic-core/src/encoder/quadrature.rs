//! Two-channel quadrature state machine

/// Levels of the A and B channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureState {
    pub a: bool,
    pub b: bool,
}

impl QuadratureState {
    pub const fn new(a: bool, b: bool) -> Self {
        Self { a, b }
    }

    /// Pack as `0b000000AB`
    pub const fn bits(self) -> u8 {
        ((self.a as u8) << 1) | self.b as u8
    }

    /// Inverse of [`QuadratureState::bits`]; higher bits are ignored
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            a: bits & 0b10 != 0,
            b: bits & 0b01 != 0,
        }
    }
}

/// Result of one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// One step clockwise, count +1
    Clockwise,
    /// One step counter-clockwise, count -1
    CounterClockwise,
    /// No channel changed, or both did; count untouched
    Invalid,
}

impl EdgeOutcome {
    /// Change to apply to the tick count
    pub const fn delta(self) -> i32 {
        match self {
            EdgeOutcome::Clockwise => 1,
            EdgeOutcome::CounterClockwise => -1,
            EdgeOutcome::Invalid => 0,
        }
    }
}

/// Classify the transition from `prev` to `next`
///
/// Valid transitions change exactly one channel. The clockwise Gray
/// sequence is `00 → 10 → 11 → 01 → 00`.
pub fn decode(prev: QuadratureState, next: QuadratureState) -> EdgeOutcome {
    let valid = (prev.a == prev.b && next.a != next.b) || (next.a == next.b && prev.a != prev.b);
    if !valid {
        return EdgeOutcome::Invalid;
    }
    if next.b == prev.a && next.a != prev.b {
        EdgeOutcome::Clockwise
    } else {
        EdgeOutcome::CounterClockwise
    }
}
