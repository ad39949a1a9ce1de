//! Board-agnostic animation engine for the companion firmware
//!
//! This crate contains everything that does not depend on specific
//! hardware:
//!
//! - Frame model: base frame plus per-frame byte deltas
//! - Delta pack format (zero-copy, validated once at load)
//! - Playback state machine and driver
//! - Expression catalog and selection policies
//! - Hardware abstraction traits (display sink, clock, randomness)
//! - Configuration types and the embedded config parser

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

#[cfg(any(feature = "alloc", test))]
pub mod authoring;
pub mod catalog;
pub mod config;
pub mod frame;
pub mod playback;
pub mod traits;

pub use catalog::{Catalog, CatalogEntry, CatalogError, SelectionPolicy};
pub use frame::{Delta, DeltaList, Frame, FrameBuffer, FrameError, FrameStore, PackError};
pub use playback::{PlaybackDriver, PlaybackError, PlaybackOutcome, PlaybackReport};
