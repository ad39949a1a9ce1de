//! External cancellation of playback

use core::sync::atomic::{AtomicBool, Ordering};

/// Checked by the playback driver at every frame boundary
pub trait AbortSignal {
    /// True if the current animation should stop
    fn is_aborted(&self) -> bool;
}

impl AbortSignal for AtomicBool {
    fn is_aborted(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: AbortSignal + ?Sized> AbortSignal for &T {
    fn is_aborted(&self) -> bool {
        (**self).is_aborted()
    }
}

/// Signal that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAbort;

impl AbortSignal for NeverAbort {
    fn is_aborted(&self) -> bool {
        false
    }
}
