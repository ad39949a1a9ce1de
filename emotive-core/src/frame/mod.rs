//! Frame model
//!
//! An animation is one full base frame followed by per-frame delta lists.
//! Each delta list is relative to the previously rendered frame, so frames
//! must be reconstructed in order into a single working buffer.
//!
//! Bitmaps are packed 1 bit per pixel, row-major, least significant bit
//! first within each byte (XBM order). A set bit is a lit pixel.

pub mod buffer;
pub mod delta;
pub mod pack;
pub mod store;

pub use buffer::FrameBuffer;
pub use delta::{apply, Delta, DeltaIter, DeltaList, RECORD_SIZE};
pub use pack::{PackError, PACK_MAGIC};
pub use store::{Frame, FrameStore};

/// Errors from frame access and reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame index or delta byte index beyond bounds
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of valid entries
        len: usize,
    },
    /// Bitmap size does not match the buffer or the declared dimensions
    DimensionMismatch {
        /// Byte length required
        expected: usize,
        /// Byte length supplied
        actual: usize,
    },
    /// Width or height is zero, or the raster is not a whole number of bytes
    InvalidDimensions,
    /// Delta or delay table length disagrees with the frame count
    LengthMismatch,
}

/// Number of bytes in a packed 1bpp bitmap, or `None` if the raster is
/// empty or does not pack into whole bytes.
pub const fn packed_len(width: u16, height: u16) -> Option<usize> {
    let pixels = width as usize * height as usize;
    if pixels == 0 || pixels % 8 != 0 {
        None
    } else {
        Some(pixels / 8)
    }
}
