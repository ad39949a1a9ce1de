//! Frame store
//!
//! Read-only description of one animation. Stores are either built from
//! Rust statics with [`FrameStore::new`] or parsed zero-copy from a delta
//! pack with [`FrameStore::from_pack`]. Both paths validate every delta
//! index up front, so playback never meets a corrupt index.

use super::delta::{Delta, DeltaList, RECORD_SIZE};
use super::pack::{self, PackError};
use super::{packed_len, FrameError};

/// One frame of a store, as handed to the playback driver
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    /// Frame 0: copy in full
    Base(&'a [u8]),
    /// Frame i > 0: apply on top of frame i-1
    Delta(DeltaList<'a>),
}

#[derive(Debug, Clone, Copy)]
enum DeltaTable<'a> {
    /// One slice per frame index >= 1
    Lists(&'a [&'a [Delta]]),
    /// Offset table (u32 LE, one per frame) into packed records
    Packed {
        offsets: &'a [u8],
        records: &'a [u8],
    },
}

impl<'a> DeltaTable<'a> {
    /// Delta list for delta frame `k` (frame index `k + 1`)
    fn get(&self, k: usize) -> Option<DeltaList<'a>> {
        match *self {
            DeltaTable::Lists(lists) => lists.get(k).map(|l| DeltaList::from_slice(*l)),
            DeltaTable::Packed { offsets, records } => {
                let start = read_u32(offsets, k)? as usize;
                let end = read_u32(offsets, k + 1)? as usize;
                records.get(start..end).map(DeltaList::from_records)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Delays<'a> {
    None,
    Table(&'a [u16]),
    Packed(&'a [u8]),
}

impl Delays<'_> {
    fn get(&self, index: usize) -> Option<u16> {
        match *self {
            Delays::None => None,
            Delays::Table(t) => t.get(index).copied(),
            Delays::Packed(b) => {
                let raw = b.get(index * 2..index * 2 + 2)?;
                Some(u16::from_le_bytes([raw[0], raw[1]]))
            }
        }
    }
}

/// Read the `k`th little-endian u32 from a byte slice
pub(crate) fn read_u32(bytes: &[u8], k: usize) -> Option<u32> {
    let raw = bytes.get(k * 4..k * 4 + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Immutable animation data: base frame plus per-frame deltas
#[derive(Debug, Clone, Copy)]
pub struct FrameStore<'a> {
    width: u16,
    height: u16,
    frame_count: u16,
    base: &'a [u8],
    deltas: DeltaTable<'a>,
    delays: Delays<'a>,
    fallback_delay_ms: Option<u16>,
}

impl<'a> FrameStore<'a> {
    /// Build a store from borrowed tables
    ///
    /// `deltas[k]` holds the changes for frame `k + 1`; the frame count is
    /// `deltas.len() + 1`. `delays`, if given, must hold one entry per frame.
    pub fn new(
        width: u16,
        height: u16,
        base: &'a [u8],
        deltas: &'a [&'a [Delta]],
        delays: Option<&'a [u16]>,
    ) -> Result<Self, FrameError> {
        let byte_len = packed_len(width, height).ok_or(FrameError::InvalidDimensions)?;
        if base.len() != byte_len {
            return Err(FrameError::DimensionMismatch {
                expected: byte_len,
                actual: base.len(),
            });
        }

        let frame_count =
            u16::try_from(deltas.len() + 1).map_err(|_| FrameError::LengthMismatch)?;

        if let Some(table) = delays {
            if table.len() != frame_count as usize {
                return Err(FrameError::LengthMismatch);
            }
        }

        for list in deltas {
            if let Some(bad) = DeltaList::from_slice(list).first_out_of_range(byte_len) {
                return Err(FrameError::IndexOutOfRange {
                    index: bad.index as usize,
                    len: byte_len,
                });
            }
        }

        Ok(Self {
            width,
            height,
            frame_count,
            base,
            deltas: DeltaTable::Lists(deltas),
            delays: delays.map_or(Delays::None, Delays::Table),
            fallback_delay_ms: None,
        })
    }

    /// Parse and validate a delta pack
    pub fn from_pack(bytes: &'a [u8]) -> Result<Self, PackError> {
        let layout = pack::parse(bytes)?;
        Ok(Self {
            width: layout.width,
            height: layout.height,
            frame_count: layout.frame_count,
            base: layout.base,
            deltas: DeltaTable::Packed {
                offsets: layout.offsets,
                records: layout.records,
            },
            delays: layout.delays.map_or(Delays::None, Delays::Packed),
            fallback_delay_ms: None,
        })
    }

    /// Use `delay_ms` for frames when the store has no delay table
    pub fn with_fallback_delay(mut self, delay_ms: u16) -> Self {
        self.fallback_delay_ms = Some(delay_ms);
        self
    }

    /// Number of logical frames (always at least 1)
    pub fn frame_count(&self) -> usize {
        self.frame_count as usize
    }

    /// (width, height) in pixels
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Size of one packed frame in bytes
    pub fn byte_len(&self) -> usize {
        self.base.len()
    }

    /// The base frame (frame 0)
    pub fn base_frame(&self) -> &'a [u8] {
        self.base
    }

    /// Access frame `index`
    ///
    /// Indices at or beyond [`frame_count`](Self::frame_count) are an error,
    /// never clamped.
    pub fn frame(&self, index: usize) -> Result<Frame<'a>, FrameError> {
        if index >= self.frame_count() {
            return Err(FrameError::IndexOutOfRange {
                index,
                len: self.frame_count(),
            });
        }
        if index == 0 {
            return Ok(Frame::Base(self.base));
        }
        self.deltas
            .get(index - 1)
            .map(Frame::Delta)
            .ok_or(FrameError::LengthMismatch)
    }

    /// True if the store carries its own per-frame delay table
    pub fn has_delay_table(&self) -> bool {
        !matches!(self.delays, Delays::None)
    }

    /// Delay after frame `index`: delay table, then the store's fallback,
    /// then `default_ms`
    pub fn delay_ms(&self, index: usize, default_ms: u16) -> u16 {
        self.delays
            .get(index)
            .or(self.fallback_delay_ms)
            .unwrap_or(default_ms)
    }

    /// Total number of delta records across all frames
    pub fn total_deltas(&self) -> usize {
        match self.deltas {
            DeltaTable::Lists(lists) => lists.iter().map(|l| l.len()).sum(),
            DeltaTable::Packed { records, .. } => records.len() / RECORD_SIZE,
        }
    }

    /// Bytes needed to hold this animation in delta form
    pub fn stored_bytes(&self) -> usize {
        let delay_bytes = if self.has_delay_table() {
            self.frame_count() * 2
        } else {
            0
        };
        self.base.len() + self.total_deltas() * RECORD_SIZE + delay_bytes
    }

    /// Bytes needed to hold every frame in full
    pub fn full_bytes(&self) -> usize {
        self.base.len() * self.frame_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: [u8; 4] = [0, 0, 0, 0];
    static F1: [Delta; 1] = [Delta::new(0, 0xFF)];
    static F2: [Delta; 0] = [];
    static TABLE: [&[Delta]; 2] = [&F1, &F2];

    fn store() -> FrameStore<'static> {
        // 8x4 pixels = 4 bytes
        FrameStore::new(8, 4, &BASE, &TABLE, None).unwrap()
    }

    #[test]
    fn test_frame_zero_is_base() {
        match store().frame(0).unwrap() {
            Frame::Base(b) => assert_eq!(b, &BASE),
            Frame::Delta(_) => panic!("frame 0 must be the base frame"),
        }
    }

    #[test]
    fn test_frame_deltas_by_index() {
        let s = store();
        assert_eq!(s.frame_count(), 3);
        match s.frame(1).unwrap() {
            Frame::Delta(d) => assert_eq!(d.len(), 1),
            Frame::Base(_) => panic!("expected delta frame"),
        }
        match s.frame(2).unwrap() {
            Frame::Delta(d) => assert!(d.is_empty()),
            Frame::Base(_) => panic!("expected delta frame"),
        }
    }

    #[test]
    fn test_frame_out_of_range_fails() {
        assert_eq!(
            store().frame(3).unwrap_err(),
            FrameError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn test_new_rejects_bad_base_length() {
        let result = FrameStore::new(16, 4, &BASE, &TABLE, None);
        assert_eq!(
            result.unwrap_err(),
            FrameError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        );
    }

    #[test]
    fn test_new_rejects_bad_delta_index() {
        static BAD: [Delta; 1] = [Delta::new(4, 1)];
        static BAD_TABLE: [&[Delta]; 1] = [&BAD];
        let result = FrameStore::new(8, 4, &BASE, &BAD_TABLE, None);
        assert_eq!(
            result.unwrap_err(),
            FrameError::IndexOutOfRange { index: 4, len: 4 }
        );
    }

    #[test]
    fn test_new_rejects_delay_table_length() {
        static DELAYS: [u16; 2] = [10, 20];
        let result = FrameStore::new(8, 4, &BASE, &TABLE, Some(&DELAYS));
        assert_eq!(result.unwrap_err(), FrameError::LengthMismatch);
    }

    #[test]
    fn test_delay_resolution_order() {
        static DELAYS: [u16; 3] = [10, 20, 30];
        let with_table = FrameStore::new(8, 4, &BASE, &TABLE, Some(&DELAYS))
            .unwrap()
            .with_fallback_delay(50);
        assert_eq!(with_table.delay_ms(1, 100), 20);

        let fallback = store().with_fallback_delay(50);
        assert_eq!(fallback.delay_ms(1, 100), 50);

        assert_eq!(store().delay_ms(1, 100), 100);
    }

    #[test]
    fn test_size_statistics() {
        let s = store();
        assert_eq!(s.total_deltas(), 1);
        assert_eq!(s.stored_bytes(), 4 + 3);
        assert_eq!(s.full_bytes(), 12);
    }
}
