//! Inter-task communication
//!
//! The framebuffer never leaves the playback task. The only shared state
//! is the abort flag, the panel fault flag and the signals below.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, Ordering};

use emotive_core::config::SelectionMode;
use emotive_core::traits::AbortSignal;

/// Stop request for the animation currently playing
pub struct AbortFlag(AtomicBool);

impl AbortFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Ask playback to stop at the next frame boundary
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Re-arm before starting the next animation
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AbortSignal for AbortFlag {
    fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Set by the button task (short press), checked by the playback driver
pub static ABORT: AbortFlag = AbortFlag::new();

/// New selection mode (long press)
pub static MODE_CHANGE: Signal<CriticalSectionRawMutex, SelectionMode> = Signal::new();

/// Short press; ends the pause between expressions early
pub static SKIP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Set while the panel is not responding, read by the heartbeat task
pub static PANEL_FAULT: AtomicBool = AtomicBool::new(false);
