//! Working framebuffer
//!
//! A single packed bitmap reused for every frame of a playback session.
//! The capacity is fixed at compile time and never changes.

use super::delta::{apply, DeltaList};
use super::FrameError;

/// Working framebuffer of exactly `N` bytes
pub struct FrameBuffer<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameBuffer<N> {
    /// Create a cleared buffer
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Buffer size in bytes
    pub const fn len(&self) -> usize {
        N
    }

    /// True for a zero-sized buffer
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Current contents
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Overwrite the whole buffer with a base frame
    pub fn load_base(&mut self, base: &[u8]) -> Result<(), FrameError> {
        if base.len() != N {
            return Err(FrameError::DimensionMismatch {
                expected: N,
                actual: base.len(),
            });
        }
        self.bytes.copy_from_slice(base);
        Ok(())
    }

    /// Apply one frame's deltas on top of the current contents
    pub fn apply(&mut self, deltas: DeltaList<'_>) -> Result<(), FrameError> {
        apply(&mut self.bytes, deltas)
    }

    /// Zero every byte
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Delta;

    #[test]
    fn test_load_base_copies_verbatim() {
        let mut fb = FrameBuffer::<4>::new();
        fb.load_base(&[1, 2, 3, 4]).unwrap();
        assert_eq!(fb.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_load_base_rejects_wrong_size() {
        let mut fb = FrameBuffer::<4>::new();
        assert_eq!(
            fb.load_base(&[1, 2, 3]),
            Err(FrameError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(fb.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_apply_keeps_previous_contents() {
        let mut fb = FrameBuffer::<4>::new();
        fb.load_base(&[9, 9, 9, 9]).unwrap();
        fb.apply(DeltaList::from_slice(&[Delta::new(1, 0)])).unwrap();
        assert_eq!(fb.as_slice(), &[9, 0, 9, 9]);
    }
}
