//! Animation catalog
//!
//! Fixed, named list of frame stores plus the bookkeeping needed to pick
//! the next one. The entry list never changes once built; selection only
//! moves the sequential cursor and draws from the random source.

use heapless::Vec;

use crate::config::{SelectionMode, MAX_EXPRESSIONS};
use crate::frame::FrameStore;
use crate::traits::RandomSource;

/// Catalog errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// No entry with the requested name
    NotFound,
    /// Random or sequential selection from a catalog with no entries
    Empty,
    /// More than [`MAX_EXPRESSIONS`] entries
    Full,
}

/// A named animation
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub name: &'a str,
    pub store: FrameStore<'a>,
}

impl<'a> CatalogEntry<'a> {
    pub const fn new(name: &'a str, store: FrameStore<'a>) -> Self {
        Self { name, store }
    }
}

/// How [`Catalog::select`] picks an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectionPolicy<'n> {
    /// Uniform over all entries
    Random,
    /// 0, 1, …, count-1, 0, …
    Sequential,
    /// Exact name match
    ByName(&'n str),
}

impl From<SelectionMode> for SelectionPolicy<'static> {
    fn from(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Random => SelectionPolicy::Random,
            SelectionMode::Sequential => SelectionPolicy::Sequential,
        }
    }
}

/// Expression catalog
pub struct Catalog<'a, R> {
    entries: Vec<CatalogEntry<'a>, MAX_EXPRESSIONS>,
    cursor: usize,
    rng: R,
}

impl<'a, R: RandomSource> Catalog<'a, R> {
    /// Create an empty catalog; entries are added with [`push`](Self::push)
    pub fn new(rng: R) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            rng,
        }
    }

    /// Build a catalog from a list of entries
    pub fn from_entries(entries: &[CatalogEntry<'a>], rng: R) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(rng);
        for entry in entries {
            catalog.push(*entry)?;
        }
        Ok(catalog)
    }

    /// Add an entry during setup
    pub fn push(&mut self, entry: CatalogEntry<'a>) -> Result<(), CatalogError> {
        self.entries.push(entry).map_err(|_| CatalogError::Full)
    }

    /// Number of animations
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// All entries in catalog order
    pub fn entries(&self) -> &[CatalogEntry<'a>] {
        &self.entries
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&CatalogEntry<'a>> {
        self.entries.get(index)
    }

    /// Index of the entry called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Pick the next animation
    ///
    /// Returns the chosen index and its entry. Only `Sequential` advances
    /// the cursor.
    pub fn select(
        &mut self,
        policy: SelectionPolicy<'_>,
    ) -> Result<(usize, &CatalogEntry<'a>), CatalogError> {
        let index = match policy {
            // A name lookup fails the same way whether or not entries exist
            SelectionPolicy::ByName(name) => self.find(name).ok_or(CatalogError::NotFound)?,
            _ if self.entries.is_empty() => return Err(CatalogError::Empty),
            SelectionPolicy::Random => self.rng.below(self.entries.len()),
            SelectionPolicy::Sequential => {
                let index = self.cursor % self.entries.len();
                self.cursor = (index + 1) % self.entries.len();
                index
            }
        };

        let entry = self.entries.get(index).ok_or(CatalogError::NotFound)?;
        Ok((index, entry))
    }
}
