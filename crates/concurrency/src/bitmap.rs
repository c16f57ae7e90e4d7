//! Transactional bitmap
//!
//! The base is a roaring bitmap; a staged transaction records insertions of
//! values missing from the base and removals of values present in it. The
//! two sets are disjoint from each other and consistent with the base:
//! `insertions ∩ base = ∅`, `removals ⊆ base`.

use crate::producer::TransactionalLayerProducer;
use crate::transaction::{Transaction, TransactionalLayerMaintainer};
use crate::writer::Writer;
use roaring::RoaringBitmap;
use std::borrow::Cow;
use tessera_core::{Bitmap, Identity, StructureId};

/// Pending changes of one `TransactionalBitmap`
#[derive(Debug, Default)]
pub struct BitmapChanges {
    insertions: RoaringBitmap,
    removals: RoaringBitmap,
}

impl BitmapChanges {
    /// Check if the layer changes nothing
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.removals.is_empty()
    }
}

/// Bitmap whose mutations are staged in a transaction overlay
#[derive(Debug, Clone, Default)]
pub struct TransactionalBitmap {
    identity: Identity,
    base: RoaringBitmap,
}

impl TransactionalBitmap {
    /// Empty bitmap
    pub fn new() -> Self {
        Self::default()
    }

    /// Bitmap whose base holds `values`
    pub fn from_values(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            identity: Identity::new(),
            base: values.into_iter().collect(),
        }
    }

    fn changes<'a>(&self, tx: Option<&'a Transaction>) -> Option<&'a BitmapChanges> {
        tx.and_then(|tx| tx.layer::<BitmapChanges>(self.structure_id()))
    }

    /// Membership test through the transaction view
    pub fn contains(&self, tx: Option<&Transaction>, value: u32) -> bool {
        match self.changes(tx) {
            None => self.base.contains(value),
            Some(changes) => {
                changes.insertions.contains(value)
                    || (self.base.contains(value) && !changes.removals.contains(value))
            }
        }
    }

    /// Number of members
    pub fn len(&self, tx: Option<&Transaction>) -> u64 {
        match self.changes(tx) {
            None => self.base.len(),
            Some(changes) => self.base.len() + changes.insertions.len() - changes.removals.len(),
        }
    }

    /// Check if the bitmap has no members
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.len(tx) == 0
    }

    /// Current members; borrows the base when no changes are staged
    pub fn view<'a>(&'a self, tx: Option<&Transaction>) -> Cow<'a, RoaringBitmap> {
        match self.changes(tx) {
            None => Cow::Borrowed(&self.base),
            Some(changes) => {
                Cow::Owned(&(&self.base - &changes.removals) | &changes.insertions)
            }
        }
    }

    /// Immutable snapshot of the current members
    pub fn bitmap(&self, tx: Option<&Transaction>) -> Bitmap {
        Bitmap::from(self.view(tx).into_owned())
    }

    /// Current members as a sorted array
    pub fn to_array(&self, tx: Option<&Transaction>) -> Vec<u32> {
        self.view(tx).iter().collect()
    }

    /// Add `value`. Returns `true` if it wasn't present.
    pub fn add(writer: Writer<'_, Self>, value: u32) -> bool {
        match writer {
            Writer::Direct(bitmap) => bitmap.base.insert(value),
            Writer::Staged(bitmap, tx) => {
                if bitmap.contains(Some(&*tx), value) {
                    return false;
                }
                let changes = tx.get_or_create_layer(bitmap);
                if !changes.removals.remove(value) {
                    changes.insertions.insert(value);
                }
                true
            }
        }
    }

    /// Remove `value`. Returns `true` if it was present.
    pub fn remove(writer: Writer<'_, Self>, value: u32) -> bool {
        match writer {
            Writer::Direct(bitmap) => bitmap.base.remove(value),
            Writer::Staged(bitmap, tx) => {
                if !bitmap.contains(Some(&*tx), value) {
                    return false;
                }
                let changes = tx.get_or_create_layer(bitmap);
                if !changes.insertions.remove(value) {
                    changes.removals.insert(value);
                }
                true
            }
        }
    }
}

impl TransactionalLayerProducer for TransactionalBitmap {
    type Layer = BitmapChanges;

    fn structure_id(&self) -> StructureId {
        self.identity.id()
    }

    fn create_layer(&self) -> BitmapChanges {
        BitmapChanges::default()
    }

    fn create_copy_with_merged_transactional_memory(
        &self,
        layer: Option<BitmapChanges>,
        _maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        let base = match layer {
            None => self.base.clone(),
            Some(changes) => &(&self.base - &changes.removals) | &changes.insertions,
        };
        Self {
            identity: Identity::new(),
            base,
        }
    }
}
