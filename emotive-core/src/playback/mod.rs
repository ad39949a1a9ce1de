//! Animation playback
//!
//! Reconstructs the frames of one [`FrameStore`](crate::frame::FrameStore)
//! into a single working buffer and hands each finished frame to a display
//! sink, pacing output by the per-frame delay.

pub mod driver;
pub mod machine;

pub use driver::{PlaybackDriver, PlaybackError, PlaybackReport, DEFAULT_FRAME_DELAY_MS};
pub use machine::{PlaybackEvent, PlaybackOutcome, PlaybackState};
