//! Time capabilities.
//!
//! The node never reads a hardware timer or spins on its own; it asks for the
//! current monotonic time through [`Clock`] and waits through [`Delay`]. On a
//! microcontroller these wrap the system timer, on a host they wrap
//! `std::time`, and in tests they drive a simulated clock.

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin (usually boot).
    fn now_ms(&self) -> u64;
}

/// A blocking delay.
pub trait Delay {
    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
