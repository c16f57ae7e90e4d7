//! Immutable bitmap of primary keys
//!
//! `Bitmap` is the universal result container handed to the query engine:
//! an ordered, deduplicated set of non-negative 32-bit integers backed by a
//! roaring bitmap. It offers no mutators; the transactional flavor lives in
//! `tessera-concurrency` and produces `Bitmap` snapshots.

use roaring::RoaringBitmap;

/// Ordered, deduplicated set of primary keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bitmap {
    inner: RoaringBitmap,
}

impl Bitmap {
    /// An empty bitmap
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a plain array (need not be sorted, duplicates are collapsed)
    pub fn from_array(values: &[u32]) -> Self {
        values.iter().copied().collect()
    }

    /// Membership test
    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        self.inner.contains(value)
    }

    /// Number of members
    #[inline]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    /// Check if the bitmap has no members
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.inner.iter()
    }

    /// Members as a sorted array
    pub fn to_array(&self) -> Vec<u32> {
        self.inner.iter().collect()
    }

    /// Union of two bitmaps
    pub fn union(&self, other: &Bitmap) -> Bitmap {
        Bitmap {
            inner: &self.inner | &other.inner,
        }
    }

    /// Borrow the backing roaring bitmap
    pub fn as_roaring(&self) -> &RoaringBitmap {
        &self.inner
    }

    /// Unwrap into the backing roaring bitmap
    pub fn into_roaring(self) -> RoaringBitmap {
        self.inner
    }
}

impl From<RoaringBitmap> for Bitmap {
    fn from(inner: RoaringBitmap) -> Self {
        Bitmap { inner }
    }
}

impl FromIterator<u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Bitmap {
            inner: iter.into_iter().collect(),
        }
    }
}
