//! Hardware abstraction traits
//!
//! These traits define the interface between the animation engine and
//! the board: where finished frames go, how time passes, where randomness
//! comes from, and how playback is interrupted.

pub mod abort;
pub mod clock;
pub mod display;
pub mod random;

pub use abort::{AbortSignal, NeverAbort};
pub use clock::Clock;
pub use display::DisplaySink;
pub use random::{RandomSource, SeededRandom};
