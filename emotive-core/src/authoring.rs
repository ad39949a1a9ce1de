//! Pack authoring
//!
//! Host-side helpers that turn full frames into delta packs and back.
//! Needs `alloc`; the firmware never links this module.

use alloc::vec;
use alloc::vec::Vec;

use crate::frame::pack::{FLAG_DELAYS, HEADER_LEN, PACK_MAGIC};
use crate::frame::{packed_len, Delta, Frame, FrameBuffer, FrameError, FrameStore, RECORD_SIZE};

/// Largest frame whose byte indices fit a `u16`
pub const MAX_FRAME_BYTES: usize = u16::MAX as usize + 1;

/// Errors while building a pack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringError {
    /// Frame size or dimensions are unusable
    Frame(FrameError),
    /// `finish` without any frame
    NoFrames,
    /// More than `u16::MAX` frames
    TooManyFrames,
    /// Some frames carry a delay and some do not
    MixedDelays,
    /// Record section would not fit the u32 offset table
    TooManyRecords,
}

impl From<FrameError> for AuthoringError {
    fn from(e: FrameError) -> Self {
        AuthoringError::Frame(e)
    }
}

impl core::fmt::Display for AuthoringError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthoringError::Frame(e) => write!(f, "invalid frame: {:?}", e),
            AuthoringError::NoFrames => write!(f, "pack has no frames"),
            AuthoringError::TooManyFrames => write!(f, "more than {} frames", u16::MAX),
            AuthoringError::MixedDelays => write!(f, "delays given for some frames only"),
            AuthoringError::TooManyRecords => write!(f, "record section larger than {} bytes", u32::MAX),
        }
    }
}

/// Every byte of `curr` that differs from `prev`, in ascending index order
pub fn diff(prev: &[u8], curr: &[u8]) -> Result<Vec<Delta>, FrameError> {
    if prev.len() != curr.len() {
        return Err(FrameError::DimensionMismatch {
            expected: prev.len(),
            actual: curr.len(),
        });
    }
    if curr.len() > MAX_FRAME_BYTES {
        return Err(FrameError::InvalidDimensions);
    }

    Ok(prev
        .iter()
        .zip(curr)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, (_, &b))| Delta::new(i as u16, b))
        .collect())
}

/// Pack a raster into 1bpp bytes, row-major, least significant bit first
pub fn pack_pixels(width: u16, height: u16, lit: impl Fn(u16, u16) -> bool) -> Result<Vec<u8>, FrameError> {
    let len = packed_len(width, height).ok_or(FrameError::InvalidDimensions)?;
    let mut out = vec![0u8; len];
    for y in 0..height {
        for x in 0..width {
            if lit(x, y) {
                let bit = y as usize * width as usize + x as usize;
                out[bit / 8] |= 1 << (bit % 8);
            }
        }
    }
    Ok(out)
}

/// Read one pixel of a packed frame. Out-of-range coordinates are dark.
pub fn pixel(frame: &[u8], width: u16, x: u16, y: u16) -> bool {
    if x >= width {
        return false;
    }
    let bit = y as usize * width as usize + x as usize;
    frame
        .get(bit / 8)
        .is_some_and(|byte| byte & (1 << (bit % 8)) != 0)
}

/// Builds a delta pack from full frames
///
/// ```ignore
/// let mut writer = PackWriter::new(128, 64)?;
/// for frame in frames {
///     writer.push_frame(&frame, Some(80))?;
/// }
/// let bytes = writer.finish()?;
/// ```
pub struct PackWriter {
    width: u16,
    height: u16,
    base: Vec<u8>,
    previous: Vec<u8>,
    frame_count: usize,
    /// Record offset of each delta frame's first record
    offsets: Vec<u32>,
    records: Vec<u8>,
    delays: Vec<Option<u16>>,
}

impl PackWriter {
    /// Start a pack for frames of `width` x `height` pixels
    pub fn new(width: u16, height: u16) -> Result<Self, FrameError> {
        let len = packed_len(width, height).ok_or(FrameError::InvalidDimensions)?;
        if len > MAX_FRAME_BYTES {
            return Err(FrameError::InvalidDimensions);
        }
        Ok(Self {
            width,
            height,
            base: Vec::new(),
            previous: Vec::new(),
            frame_count: 0,
            offsets: Vec::new(),
            records: Vec::new(),
            delays: Vec::new(),
        })
    }

    /// Frame size in bytes
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize / 8
    }

    /// Frames added so far
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Delta records written so far
    pub fn total_deltas(&self) -> usize {
        self.records.len() / RECORD_SIZE
    }

    /// Append one full frame, with the delay that follows it
    pub fn push_frame(&mut self, frame: &[u8], delay_ms: Option<u16>) -> Result<(), AuthoringError> {
        if frame.len() != self.frame_len() {
            return Err(FrameError::DimensionMismatch {
                expected: self.frame_len(),
                actual: frame.len(),
            }
            .into());
        }
        if self.frame_count == u16::MAX as usize {
            return Err(AuthoringError::TooManyFrames);
        }

        if self.frame_count == 0 {
            self.base = frame.to_vec();
        } else {
            let deltas = diff(&self.previous, frame)?;
            let start = record_offset(self.records.len())?;
            record_offset(self.records.len() + deltas.len() * RECORD_SIZE)?;

            self.offsets.push(start);
            for delta in deltas {
                self.records.extend_from_slice(&delta.index.to_le_bytes());
                self.records.push(delta.value);
            }
        }

        self.previous.clear();
        self.previous.extend_from_slice(frame);
        self.delays.push(delay_ms);
        self.frame_count += 1;
        Ok(())
    }

    /// Serialise the pack
    pub fn finish(self) -> Result<Vec<u8>, AuthoringError> {
        if self.frame_count == 0 {
            return Err(AuthoringError::NoFrames);
        }

        let with_delays = self.delays.iter().all(Option::is_some);
        if !with_delays && self.delays.iter().any(Option::is_some) {
            return Err(AuthoringError::MixedDelays);
        }

        let mut out = Vec::with_capacity(
            HEADER_LEN + self.frame_count * 6 + self.base.len() + self.records.len(),
        );
        out.extend_from_slice(&PACK_MAGIC);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&(self.frame_count as u16).to_le_bytes());
        let flags = if with_delays { FLAG_DELAYS } else { 0 };
        out.extend_from_slice(&flags.to_le_bytes());

        if with_delays {
            for delay in self.delays.iter().flatten() {
                out.extend_from_slice(&delay.to_le_bytes());
            }
        }

        out.extend_from_slice(&self.base);

        for offset in &self.offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        // Terminator: total record length
        out.extend_from_slice(&record_offset(self.records.len())?.to_le_bytes());

        out.extend_from_slice(&self.records);
        Ok(out)
    }
}

/// Byte position in the record section as stored in the offset table
fn record_offset(len: usize) -> Result<u32, AuthoringError> {
    u32::try_from(len).map_err(|_| AuthoringError::TooManyRecords)
}

/// Expand every frame of a store in order
pub fn reconstruct(store: &FrameStore<'_>) -> Result<Vec<Vec<u8>>, FrameError> {
    let mut current = vec![0u8; store.byte_len()];
    let mut frames = Vec::with_capacity(store.frame_count());

    for i in 0..store.frame_count() {
        match store.frame(i)? {
            Frame::Base(base) => current.copy_from_slice(base),
            Frame::Delta(deltas) => crate::frame::apply(&mut current, deltas)?,
        }
        frames.push(current.clone());
    }

    Ok(frames)
}

/// Render the last frame of a store into a fixed buffer
///
/// Convenience for callers that only need the final picture, e.g. a
/// still preview.
pub fn last_frame<const N: usize>(store: &FrameStore<'_>) -> Result<FrameBuffer<N>, FrameError> {
    let mut buffer = FrameBuffer::<N>::new();
    for i in 0..store.frame_count() {
        match store.frame(i)? {
            Frame::Base(base) => buffer.load_base(base)?,
            Frame::Delta(deltas) => buffer.apply(deltas)?,
        }
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PackError;
    use proptest::prelude::*;

    fn frames_8x2() -> Vec<Vec<u8>> {
        vec![vec![0x00, 0x00], vec![0x00, 0x81], vec![0x00, 0x81], vec![0xFF, 0x01]]
    }

    #[test]
    fn test_diff_lists_changed_bytes() {
        let d = diff(&[1, 2, 3, 4], &[1, 9, 3, 0]).unwrap();
        assert_eq!(d, [Delta::new(1, 9), Delta::new(3, 0)]);
        assert!(diff(&[5; 4], &[5; 4]).unwrap().is_empty());
    }

    #[test]
    fn test_diff_length_mismatch() {
        assert_eq!(
            diff(&[0; 4], &[0; 3]).unwrap_err(),
            FrameError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_pack_pixels_lsb_first() {
        // 16x2: light (0,0), (9,0) and (15,1)
        let frame = pack_pixels(16, 2, |x, y| matches!((x, y), (0, 0) | (9, 0) | (15, 1))).unwrap();
        assert_eq!(frame, [0x01, 0x02, 0x00, 0x80]);
        assert!(pixel(&frame, 16, 9, 0));
        assert!(!pixel(&frame, 16, 8, 0));
        assert!(pixel(&frame, 16, 15, 1));
        assert!(!pixel(&frame, 16, 16, 1));
    }

    #[test]
    fn test_writer_output_parses_and_matches() {
        let frames = frames_8x2();
        let mut writer = PackWriter::new(8, 2).unwrap();
        for f in &frames {
            writer.push_frame(f, None).unwrap();
        }
        assert_eq!(writer.total_deltas(), 1 + 0 + 2);
        let bytes = writer.finish().unwrap();

        let store = FrameStore::from_pack(&bytes).unwrap();
        assert_eq!(store.frame_count(), 4);
        assert!(!store.has_delay_table());
        assert_eq!(reconstruct(&store).unwrap(), frames);
        assert_eq!(last_frame::<2>(&store).unwrap().as_slice(), &[0xFF, 0x01]);
    }

    #[test]
    fn test_writer_delay_table() {
        let mut writer = PackWriter::new(8, 2).unwrap();
        for (f, d) in frames_8x2().iter().zip([10, 20, 30, 40]) {
            writer.push_frame(f, Some(d)).unwrap();
        }
        let bytes = writer.finish().unwrap();
        let store = FrameStore::from_pack(&bytes).unwrap();
        assert!(store.has_delay_table());
        assert_eq!(store.delay_ms(3, 100), 40);
    }

    #[test]
    fn test_writer_single_frame() {
        let mut writer = PackWriter::new(8, 2).unwrap();
        writer.push_frame(&[0xAA, 0x55], None).unwrap();
        let bytes = writer.finish().unwrap();
        let store = FrameStore::from_pack(&bytes).unwrap();
        assert_eq!(store.frame_count(), 1);
        assert_eq!(reconstruct(&store).unwrap(), vec![vec![0xAA, 0x55]]);
    }

    #[test]
    fn test_writer_errors() {
        assert_eq!(
            PackWriter::new(8, 2).unwrap().finish().unwrap_err(),
            AuthoringError::NoFrames
        );

        let mut writer = PackWriter::new(8, 2).unwrap();
        assert!(writer.push_frame(&[0; 3], None).is_err());
        writer.push_frame(&[0; 2], Some(50)).unwrap();
        writer.push_frame(&[1; 2], None).unwrap();
        assert_eq!(writer.finish().unwrap_err(), AuthoringError::MixedDelays);

        assert!(PackWriter::new(3, 3).is_err());
    }

    #[test]
    fn test_record_offset_limit() {
        assert_eq!(record_offset(0), Ok(0));
        assert_eq!(record_offset(u32::MAX as usize), Ok(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_record_offset_past_u32_is_rejected() {
        assert_eq!(
            record_offset(u32::MAX as usize + 1),
            Err(AuthoringError::TooManyRecords)
        );
    }

    #[test]
    fn test_corrupted_writer_output_is_rejected() {
        let mut writer = PackWriter::new(8, 2).unwrap();
        for f in &frames_8x2() {
            writer.push_frame(f, None).unwrap();
        }
        let mut bytes = writer.finish().unwrap();
        bytes.pop();
        assert_eq!(FrameStore::from_pack(&bytes).unwrap_err(), PackError::Truncated);
    }

    proptest! {
        #[test]
        fn prop_pack_roundtrip_reconstructs_frames(
            frames in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 16),
                1..12,
            ),
        ) {
            // 16x8 raster = 16 bytes
            let mut writer = PackWriter::new(16, 8).unwrap();
            for f in &frames {
                writer.push_frame(f, None).unwrap();
            }
            let bytes = writer.finish().unwrap();
            let store = FrameStore::from_pack(&bytes).unwrap();
            prop_assert_eq!(reconstruct(&store).unwrap(), frames);
        }
    }
}
