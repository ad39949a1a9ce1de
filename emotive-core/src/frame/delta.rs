//! Byte deltas and the delta applicator

use super::FrameError;

/// Size of one packed delta record: index (u16 LE) + value (u8)
pub const RECORD_SIZE: usize = 3;

/// One changed byte between consecutive frames
///
/// `value` replaces the whole byte; it is not a mask or an XOR patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delta {
    /// Byte offset into the packed bitmap
    pub index: u16,
    /// Replacement byte
    pub value: u8,
}

impl Delta {
    /// Create a delta
    pub const fn new(index: u16, value: u8) -> Self {
        Self { index, value }
    }

    /// Decode one packed record
    fn from_record(record: &[u8]) -> Self {
        Self {
            index: u16::from_le_bytes([record[0], record[1]]),
            value: record[2],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Repr<'a> {
    Slice(&'a [Delta]),
    Records(&'a [u8]),
}

/// Ordered delta list for one frame
///
/// Either borrows a slice of [`Delta`] values (Rust statics) or packed
/// 3-byte records straight out of a delta pack. The length always comes
/// from the data itself.
#[derive(Debug, Clone, Copy)]
pub struct DeltaList<'a>(Repr<'a>);

impl<'a> DeltaList<'a> {
    /// Empty list (frame identical to its predecessor)
    pub const EMPTY: DeltaList<'static> = DeltaList(Repr::Slice(&[]));

    /// Borrow a slice of deltas
    pub const fn from_slice(deltas: &'a [Delta]) -> Self {
        Self(Repr::Slice(deltas))
    }

    /// Borrow packed records. Trailing partial records are ignored, callers
    /// validate the length before constructing.
    pub(crate) const fn from_records(records: &'a [u8]) -> Self {
        Self(Repr::Records(records))
    }

    /// Number of deltas in the list
    pub fn len(&self) -> usize {
        match self.0 {
            Repr::Slice(s) => s.len(),
            Repr::Records(r) => r.len() / RECORD_SIZE,
        }
    }

    /// True if the frame is unchanged from its predecessor
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the deltas in application order
    pub fn iter(&self) -> DeltaIter<'a> {
        match self.0 {
            Repr::Slice(s) => DeltaIter::Slice(s.iter()),
            Repr::Records(r) => DeltaIter::Records(r.chunks_exact(RECORD_SIZE)),
        }
    }

    /// First delta whose index does not fit a buffer of `len` bytes
    pub fn first_out_of_range(&self, len: usize) -> Option<Delta> {
        self.iter().find(|d| d.index as usize >= len)
    }
}

impl<'a> IntoIterator for DeltaList<'a> {
    type Item = Delta;
    type IntoIter = DeltaIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`DeltaList`]
pub enum DeltaIter<'a> {
    #[doc(hidden)]
    Slice(core::slice::Iter<'a, Delta>),
    #[doc(hidden)]
    Records(core::slice::ChunksExact<'a, u8>),
}

impl Iterator for DeltaIter<'_> {
    type Item = Delta;

    fn next(&mut self) -> Option<Delta> {
        match self {
            DeltaIter::Slice(it) => it.next().copied(),
            DeltaIter::Records(it) => it.next().map(Delta::from_record),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            DeltaIter::Slice(it) => it.size_hint(),
            DeltaIter::Records(it) => it.size_hint(),
        }
    }
}

/// Apply a delta list to a frame buffer in place
///
/// Every index is checked before anything is written, so a list with an
/// out-of-range index leaves `buffer` untouched and returns
/// [`FrameError::IndexOutOfRange`].
pub fn apply(buffer: &mut [u8], deltas: DeltaList<'_>) -> Result<(), FrameError> {
    if let Some(bad) = deltas.first_out_of_range(buffer.len()) {
        return Err(FrameError::IndexOutOfRange {
            index: bad.index as usize,
            len: buffer.len(),
        });
    }

    for delta in deltas {
        buffer[delta.index as usize] = delta.value;
    }

    Ok(())
}
