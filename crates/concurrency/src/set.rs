//! Transactional ordered set, a `TransactionalMap` with unit values

use crate::map::{MapChanges, TransactionalMap};
use crate::producer::TransactionalLayerProducer;
use crate::transaction::{Transaction, TransactionalLayerMaintainer};
use crate::writer::Writer;
use crate::project;
use tessera_core::StructureId;

/// Ordered set whose mutations are staged in a transaction overlay
#[derive(Debug, Clone)]
pub struct TransactionalSet<K> {
    inner: TransactionalMap<K, ()>,
}

impl<K> Default for TransactionalSet<K> {
    fn default() -> Self {
        Self {
            inner: TransactionalMap::default(),
        }
    }
}

impl<K: Ord> FromIterator<K> for TransactionalSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|key| (key, ())).collect(),
        }
    }
}

impl<K: Ord + Clone + Send + Sync + 'static> TransactionalSet<K> {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test through the transaction view
    pub fn contains(&self, tx: Option<&Transaction>, key: &K) -> bool {
        self.inner.contains_key(tx, key)
    }

    /// Number of members
    pub fn len(&self, tx: Option<&Transaction>) -> usize {
        self.inner.len(tx)
    }

    /// Check if the set has no members
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.inner.is_empty(tx)
    }

    /// Members in order
    pub fn iter<'a>(&'a self, tx: Option<&'a Transaction>) -> impl Iterator<Item = &'a K> + 'a {
        self.inner.keys(tx)
    }

    /// Add `key`. Returns `true` if it wasn't present.
    pub fn insert(writer: Writer<'_, Self>, key: K) -> bool {
        TransactionalMap::insert(project!(writer, inner), key, ())
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn remove(writer: Writer<'_, Self>, key: &K) -> bool {
        TransactionalMap::remove(project!(writer, inner), key)
    }
}

impl<K: Ord + Clone + Send + Sync + 'static> TransactionalLayerProducer for TransactionalSet<K> {
    type Layer = MapChanges<K, ()>;

    fn structure_id(&self) -> StructureId {
        self.inner.structure_id()
    }

    fn create_layer(&self) -> MapChanges<K, ()> {
        self.inner.create_layer()
    }

    fn create_copy_with_merged_transactional_memory(
        &self,
        layer: Option<MapChanges<K, ()>>,
        maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        Self {
            inner: self
                .inner
                .create_copy_with_merged_transactional_memory(layer, maintainer),
        }
    }
}
