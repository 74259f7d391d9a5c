//! Blocking waits used for retry back-off and rate limiting.

use std::time::Duration;

/// Something that can block the current thread for a while.
///
/// The client and the batch processor never call [`std::thread::sleep`]
/// directly; they go through this trait so the waits can be recorded in tests.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// [`Pause`] implementation backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<P: Pause + ?Sized> Pause for &P {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}

impl<P: Pause + ?Sized> Pause for std::rc::Rc<P> {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}
