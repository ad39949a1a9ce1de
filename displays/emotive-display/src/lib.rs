//! OLED display sink for Emotive
//!
//! This crate provides:
//! - `Ssd1306` async I2C driver that implements the engine's `DisplaySink`
//! - Row-major (XBM order) to SSD1306 page layout conversion
//!
//! The driver keeps one page of scratch space and no framebuffer of its
//! own: the playback driver owns the only frame.

#![no_std]
#![deny(unsafe_code)]

pub mod bitmap;
pub mod ssd1306;

// Re-export key types
pub use ssd1306::{DisplayError, PanelConfig, Ssd1306, DEFAULT_ADDRESS, FRAME_BYTES, HEIGHT, WIDTH};
