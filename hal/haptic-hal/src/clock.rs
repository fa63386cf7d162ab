//! Monotonic time source

/// Monotonic clock with microsecond resolution
///
/// The value must never decrease. It does not need to start at zero.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;

    /// Milliseconds since the same origin
    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }
}
