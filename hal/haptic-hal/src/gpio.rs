//! GPIO pin abstractions
//!
//! Encoder channels are sampled as plain digital levels. Edge notification
//! is left to the platform (interrupts or async edge waits); the handler
//! reads both levels through this trait when an edge arrives.

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip. No debouncing is expected.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl<T: InputPin + ?Sized> InputPin for &T {
    fn is_high(&self) -> bool {
        (**self).is_high()
    }
}
