//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod button;
pub mod heartbeat;
pub mod playback;

pub use button::button_task;
pub use heartbeat::heartbeat_task;
pub use playback::{playback_task, Driver, PlaybackSettings};
