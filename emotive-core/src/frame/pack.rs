//! Delta pack container
//!
//! Binary format for one animation, little-endian, byte aligned, parsed
//! without copying:
//!
//! ```text
//! ┌───────┬───────┬────────┬────────┬───────┬──────────┬──────┬─────────┬─────────┐
//! │ MAGIC │ WIDTH │ HEIGHT │ FRAMES │ FLAGS │ DELAYS   │ BASE │ OFFSETS │ RECORDS │
//! │ 4B    │ 2B    │ 2B     │ 2B     │ 2B    │ 2B/frame │ w*h/8│ 4B/frame│ 3B each │
//! └───────┴───────┴────────┴────────┴───────┴──────────┴──────┴─────────┴─────────┘
//! ```
//!
//! - DELAYS is present only when FLAGS bit 0 is set (milliseconds per frame)
//! - OFFSETS entry `k` is the start of frame `k + 1`'s records; the last entry
//!   is the total length of RECORDS
//! - each record is a byte index (u16) and its replacement value (u8)

use super::delta::{DeltaList, RECORD_SIZE};
use super::packed_len;
use super::store::read_u32;

/// Pack magic bytes
pub const PACK_MAGIC: [u8; 4] = *b"EPK1";

/// Fixed header size
pub const HEADER_LEN: usize = 12;

/// FLAGS bit: per-frame delay table present
pub const FLAG_DELAYS: u16 = 1 << 0;

/// Errors that can occur while parsing a delta pack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PackError {
    /// Data does not start with [`PACK_MAGIC`]
    BadMagic,
    /// Data ends before a declared section
    Truncated,
    /// Width/height of zero or not a whole number of bytes
    InvalidDimensions,
    /// Frame count of zero
    NoFrames,
    /// Unknown bits set in FLAGS
    UnsupportedFlags,
    /// Offset table not monotonic, misaligned, or not covering all records
    BadOffsets,
    /// Bytes left over after the record section
    TrailingBytes,
    /// A record addresses a byte outside the frame
    IndexOutOfRange {
        /// Frame the record belongs to
        frame: u16,
        /// Offending byte index
        index: u16,
    },
}

/// Validated section boundaries of a pack
pub(crate) struct PackLayout<'a> {
    pub width: u16,
    pub height: u16,
    pub frame_count: u16,
    pub delays: Option<&'a [u8]>,
    pub base: &'a [u8],
    pub offsets: &'a [u8],
    pub records: &'a [u8],
}

/// Sequential reader over the pack bytes
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PackError> {
        let end = self.pos.checked_add(len).ok_or(PackError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(PackError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, PackError> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        rest
    }
}

/// Parse and fully validate a pack
pub(crate) fn parse(bytes: &[u8]) -> Result<PackLayout<'_>, PackError> {
    let mut reader = Reader::new(bytes);

    if reader.take(4)? != PACK_MAGIC {
        return Err(PackError::BadMagic);
    }

    let width = reader.u16()?;
    let height = reader.u16()?;
    let frame_count = reader.u16()?;
    let flags = reader.u16()?;

    let byte_len = packed_len(width, height).ok_or(PackError::InvalidDimensions)?;
    if frame_count == 0 {
        return Err(PackError::NoFrames);
    }
    if flags & !FLAG_DELAYS != 0 {
        return Err(PackError::UnsupportedFlags);
    }

    let frames = frame_count as usize;
    let delays = if flags & FLAG_DELAYS != 0 {
        Some(reader.take(frames * 2)?)
    } else {
        None
    };
    let base = reader.take(byte_len)?;
    let offsets = reader.take(frames * 4)?;
    let records = reader.rest();

    validate_offsets(offsets, frames, records.len())?;
    validate_records(offsets, records, frames, byte_len)?;

    Ok(PackLayout {
        width,
        height,
        frame_count,
        delays,
        base,
        offsets,
        records,
    })
}

fn validate_offsets(offsets: &[u8], frames: usize, records_len: usize) -> Result<(), PackError> {
    let mut previous = 0usize;
    for k in 0..frames {
        let offset = read_u32(offsets, k).ok_or(PackError::Truncated)? as usize;
        if offset < previous || offset % RECORD_SIZE != 0 {
            return Err(PackError::BadOffsets);
        }
        previous = offset;
    }

    // Records start at zero; for a single-frame pack the only entry is the
    // terminator, so the record section must be empty
    if read_u32(offsets, 0) != Some(0) {
        return Err(PackError::BadOffsets);
    }

    match previous.cmp(&records_len) {
        core::cmp::Ordering::Equal => Ok(()),
        core::cmp::Ordering::Less => Err(PackError::TrailingBytes),
        core::cmp::Ordering::Greater => Err(PackError::Truncated),
    }
}

fn validate_records(
    offsets: &[u8],
    records: &[u8],
    frames: usize,
    byte_len: usize,
) -> Result<(), PackError> {
    for k in 0..frames.saturating_sub(1) {
        let start = read_u32(offsets, k).ok_or(PackError::Truncated)? as usize;
        let end = read_u32(offsets, k + 1).ok_or(PackError::Truncated)? as usize;
        let slice = records.get(start..end).ok_or(PackError::BadOffsets)?;
        if let Some(bad) = DeltaList::from_records(slice).first_out_of_range(byte_len) {
            return Err(PackError::IndexOutOfRange {
                frame: (k + 1) as u16,
                index: bad.index,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::frame::{Delta, Frame, FrameStore};
    use proptest::prelude::*;
    use std::vec::Vec;

    /// Hand-assembled 8x2 pack (2 bytes per frame) with three frames
    fn sample_pack(with_delays: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&PACK_MAGIC);
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&3u16.to_le_bytes());
        let flags = if with_delays { FLAG_DELAYS } else { 0 };
        out.extend_from_slice(&flags.to_le_bytes());
        if with_delays {
            for d in [40u16, 50, 60] {
                out.extend_from_slice(&d.to_le_bytes());
            }
        }
        // base
        out.extend_from_slice(&[0x00, 0x00]);
        // offsets: frame 1 at 0, frame 2 at 3, end at 3
        for o in [0u32, 3, 3] {
            out.extend_from_slice(&o.to_le_bytes());
        }
        // frame 1: byte 1 -> 0x81
        out.extend_from_slice(&[0x01, 0x00, 0x81]);
        out
    }

    #[test]
    fn test_parse_sample() {
        let bytes = sample_pack(false);
        let store = FrameStore::from_pack(&bytes).unwrap();
        assert_eq!(store.dimensions(), (8, 2));
        assert_eq!(store.frame_count(), 3);
        assert!(!store.has_delay_table());

        match store.frame(1).unwrap() {
            Frame::Delta(d) => {
                let deltas: Vec<Delta> = d.iter().collect();
                assert_eq!(deltas, [Delta::new(1, 0x81)]);
            }
            Frame::Base(_) => panic!("expected delta frame"),
        }
        match store.frame(2).unwrap() {
            Frame::Delta(d) => assert!(d.is_empty()),
            Frame::Base(_) => panic!("expected delta frame"),
        }
    }

    #[test]
    fn test_parse_delay_table() {
        let bytes = sample_pack(true);
        let store = FrameStore::from_pack(&bytes).unwrap();
        assert!(store.has_delay_table());
        assert_eq!(store.delay_ms(0, 100), 40);
        assert_eq!(store.delay_ms(2, 100), 60);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_pack(false);
        bytes[0] = b'X';
        assert_eq!(FrameStore::from_pack(&bytes).unwrap_err(), PackError::BadMagic);
    }

    #[test]
    fn test_truncated() {
        let bytes = sample_pack(false);
        for cut in [0, 3, 11, 13, 20] {
            assert!(FrameStore::from_pack(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = sample_pack(false);
        bytes.push(0);
        assert_eq!(
            FrameStore::from_pack(&bytes).unwrap_err(),
            PackError::TrailingBytes
        );
    }

    #[test]
    fn test_record_index_out_of_range() {
        let mut bytes = sample_pack(false);
        let last = bytes.len() - 3;
        // index 2 is past the 2-byte frame
        bytes[last] = 0x02;
        assert_eq!(
            FrameStore::from_pack(&bytes).unwrap_err(),
            PackError::IndexOutOfRange { frame: 1, index: 2 }
        );
    }

    #[test]
    fn test_misaligned_offsets() {
        let mut bytes = sample_pack(false);
        // offsets start after header + base
        let offsets_at = HEADER_LEN + 2;
        bytes[offsets_at + 4] = 2;
        assert_eq!(FrameStore::from_pack(&bytes).unwrap_err(), PackError::BadOffsets);
    }

    #[test]
    fn test_zero_frames() {
        let mut bytes = sample_pack(false);
        bytes[8] = 0;
        assert_eq!(FrameStore::from_pack(&bytes).unwrap_err(), PackError::NoFrames);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = FrameStore::from_pack(&data);
        }

        #[test]
        fn prop_parse_never_panics_with_valid_header(
            tail in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let mut data = sample_pack(false);
            data.truncate(HEADER_LEN);
            data.extend_from_slice(&tail);
            if let Ok(store) = FrameStore::from_pack(&data) {
                for i in 0..store.frame_count() {
                    prop_assert!(store.frame(i).is_ok());
                }
            }
        }
    }
}
