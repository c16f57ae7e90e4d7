//! Transactional ordered map
//!
//! The base is a `BTreeMap`; a staged transaction records overwritten or
//! inserted entries in `modified` and deleted base keys in `removed`.
//! `removed` only ever holds keys of the base and never a key of `modified`.
//!
//! Maps whose values are `Arc<P>` of another producer get a second set of
//! helpers (`with_child`, `with_child_or_create`, `remove_child`,
//! `merge_children`, `clear_children`). A child mutated within a transaction
//! is always re-inserted into `modified`; commit merges exactly those
//! children and shares every untouched `Arc` with the previous base.

use crate::producer::TransactionalLayerProducer;
use crate::transaction::{Transaction, TransactionalLayerMaintainer};
use crate::writer::Writer;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::iter::Peekable;
use std::ops::RangeBounds;
use std::sync::Arc;
use tessera_core::{Identity, StructureId};

/// Pending changes of one `TransactionalMap`
#[derive(Debug)]
pub struct MapChanges<K, V> {
    modified: BTreeMap<K, V>,
    removed: BTreeSet<K>,
}

impl<K, V> Default for MapChanges<K, V> {
    fn default() -> Self {
        Self {
            modified: BTreeMap::new(),
            removed: BTreeSet::new(),
        }
    }
}

impl<K: Ord, V> MapChanges<K, V> {
    fn stage_insert(&mut self, key: K, value: V) {
        self.removed.remove(&key);
        self.modified.insert(key, value);
    }

    /// Keys written by the transaction
    pub fn modified_keys(&self) -> impl Iterator<Item = &K> {
        self.modified.keys()
    }

    /// Base keys deleted by the transaction
    pub fn removed_keys(&self) -> impl Iterator<Item = &K> {
        self.removed.iter()
    }
}

/// Ordered map whose mutations are staged in a transaction overlay
#[derive(Debug, Clone)]
pub struct TransactionalMap<K, V> {
    identity: Identity,
    base: BTreeMap<K, V>,
}

impl<K, V> Default for TransactionalMap<K, V> {
    fn default() -> Self {
        Self {
            identity: Identity::new(),
            base: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TransactionalMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            identity: Identity::new(),
            base: iter.into_iter().collect(),
        }
    }
}

impl<K, V> TransactionalMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    fn changes<'a>(&self, tx: Option<&'a Transaction>) -> Option<&'a MapChanges<K, V>> {
        tx.and_then(|tx| tx.layer::<MapChanges<K, V>>(self.structure_id()))
    }

    /// Value of `key` through the transaction view
    pub fn get<'a, Q>(&'a self, tx: Option<&'a Transaction>, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.changes(tx) {
            None => self.base.get(key),
            Some(changes) => {
                if let Some(value) = changes.modified.get(key) {
                    Some(value)
                } else if changes.removed.contains(key) {
                    None
                } else {
                    self.base.get(key)
                }
            }
        }
    }

    /// Check if `key` is present
    pub fn contains_key<Q>(&self, tx: Option<&Transaction>, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(tx, key).is_some()
    }

    /// Number of entries
    pub fn len(&self, tx: Option<&Transaction>) -> usize {
        match self.changes(tx) {
            None => self.base.len(),
            Some(changes) => {
                let added = changes
                    .modified
                    .keys()
                    .filter(|key| !self.base.contains_key(key))
                    .count();
                self.base.len() - changes.removed.len() + added
            }
        }
    }

    /// Check if the map has no entries
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.len(tx) == 0
    }

    /// Entries in key order
    pub fn iter<'a>(&'a self, tx: Option<&'a Transaction>) -> Iter<'a, K, V> {
        self.range(tx, ..)
    }

    /// Entries whose keys fall in `bounds`, in key order
    pub fn range<'a, R>(&'a self, tx: Option<&'a Transaction>, bounds: R) -> Iter<'a, K, V>
    where
        R: RangeBounds<K> + Clone,
    {
        let changes = self.changes(tx);
        Iter {
            base: self.base.range::<K, R>(bounds.clone()).peekable(),
            modified: changes.map(|changes| changes.modified.range::<K, R>(bounds).peekable()),
            removed: changes.map(|changes| &changes.removed),
        }
    }

    /// Keys in order
    pub fn keys<'a>(&'a self, tx: Option<&'a Transaction>) -> impl Iterator<Item = &'a K> + 'a {
        self.iter(tx).map(|(key, _)| key)
    }

    /// Values in key order
    pub fn values<'a>(&'a self, tx: Option<&'a Transaction>) -> impl Iterator<Item = &'a V> + 'a {
        self.iter(tx).map(|(_, value)| value)
    }

    /// Insert or overwrite `key`. Returns `true` if the key was absent.
    pub fn insert(writer: Writer<'_, Self>, key: K, value: V) -> bool {
        match writer {
            Writer::Direct(map) => map.base.insert(key, value).is_none(),
            Writer::Staged(map, tx) => {
                let absent = !map.contains_key(Some(&*tx), &key);
                tx.get_or_create_layer(map).stage_insert(key, value);
                absent
            }
        }
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn remove(writer: Writer<'_, Self>, key: &K) -> bool {
        match writer {
            Writer::Direct(map) => map.base.remove(key).is_some(),
            Writer::Staged(map, tx) => {
                if !map.contains_key(Some(&*tx), key) {
                    return false;
                }
                let in_base = map.base.contains_key(key);
                let changes = tx.get_or_create_layer(map);
                changes.modified.remove(key);
                if in_base {
                    changes.removed.insert(key.clone());
                }
                true
            }
        }
    }

    /// Replace the value of `key` with `f(current)`; `None` removes the key
    pub fn compute(writer: Writer<'_, Self>, key: K, f: impl FnOnce(Option<&V>) -> Option<V>) {
        let next = f(writer.target().get(writer.transaction(), &key));
        match next {
            Some(value) => {
                Self::insert(writer, key, value);
            }
            None => {
                Self::remove(writer, &key);
            }
        }
    }
}

impl<K, P> TransactionalMap<K, Arc<P>>
where
    K: Ord + Clone + Send + Sync + 'static,
    P: TransactionalLayerProducer + Clone + Send + Sync + 'static,
{
    /// Run `f` with write access to the child stored under `key`.
    ///
    /// Returns `None` when the key is absent. In staged mode the child is
    /// marked as touched so that commit merges it.
    pub fn with_child<R>(
        writer: Writer<'_, Self>,
        key: &K,
        f: impl FnOnce(Writer<'_, P>) -> R,
    ) -> Option<R> {
        match writer {
            Writer::Direct(map) => map
                .base
                .get_mut(key)
                .map(|child| f(Writer::Direct(Arc::make_mut(child)))),
            Writer::Staged(map, tx) => {
                let child = Arc::clone(map.get(Some(&*tx), key)?);
                tx.get_or_create_layer(map)
                    .stage_insert(key.clone(), Arc::clone(&child));
                Some(f(Writer::Staged(&child, tx)))
            }
        }
    }

    /// Like `with_child`, creating the child with `create` when absent
    pub fn with_child_or_create<R>(
        writer: Writer<'_, Self>,
        key: K,
        create: impl FnOnce() -> P,
        f: impl FnOnce(Writer<'_, P>) -> R,
    ) -> R {
        match writer {
            Writer::Direct(map) => {
                let child = map.base.entry(key).or_insert_with(|| Arc::new(create()));
                f(Writer::Direct(Arc::make_mut(child)))
            }
            Writer::Staged(map, tx) => {
                let child = match map.get(Some(&*tx), &key) {
                    Some(child) => Arc::clone(child),
                    None => Arc::new(create()),
                };
                tx.get_or_create_layer(map)
                    .stage_insert(key, Arc::clone(&child));
                f(Writer::Staged(&child, tx))
            }
        }
    }

    /// Remove the child under `key`, dropping its transactional memory.
    /// Returns `true` if it was present.
    pub fn remove_child(writer: Writer<'_, Self>, key: &K) -> bool {
        match writer {
            Writer::Direct(map) => map.base.remove(key).is_some(),
            Writer::Staged(map, tx) => {
                let Some(child) = map.get(Some(&*tx), key).map(Arc::clone) else {
                    return false;
                };
                child.clear_transactional_memory(tx);
                Self::remove(Writer::Staged(map, tx), key)
            }
        }
    }

    /// Merged copy whose touched children are merged through `maintainer`
    pub fn merge_children(&self, maintainer: &mut TransactionalLayerMaintainer<'_>) -> Self {
        let mut base = self.base.clone();
        if let Some(changes) = maintainer.take_layer::<MapChanges<K, Arc<P>>>(self.structure_id()) {
            for key in &changes.removed {
                base.remove(key);
            }
            for (key, child) in changes.modified {
                let merged = maintainer.get_state_copy_with_committed_changes(child.as_ref());
                base.insert(key, Arc::new(merged));
            }
        }
        Self {
            identity: Identity::new(),
            base,
        }
    }

    /// Drop this map's layer and the memory of every touched child
    pub fn clear_children(&self, tx: &mut Transaction) {
        if let Some(changes) = tx.take_layer::<MapChanges<K, Arc<P>>>(self.structure_id()) {
            for child in changes.modified.values() {
                child.clear_transactional_memory(tx);
            }
        }
    }
}

impl<K, V> TransactionalLayerProducer for TransactionalMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Layer = MapChanges<K, V>;

    fn structure_id(&self) -> StructureId {
        self.identity.id()
    }

    fn create_layer(&self) -> MapChanges<K, V> {
        MapChanges::default()
    }

    fn create_copy_with_merged_transactional_memory(
        &self,
        layer: Option<MapChanges<K, V>>,
        _maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        let mut base = self.base.clone();
        if let Some(changes) = layer {
            for key in &changes.removed {
                base.remove(key);
            }
            base.extend(changes.modified);
        }
        Self {
            identity: Identity::new(),
            base,
        }
    }
}

/// Ordered iterator over the transaction view of a `TransactionalMap`
pub struct Iter<'a, K, V> {
    base: Peekable<btree_map::Range<'a, K, V>>,
    modified: Option<Peekable<btree_map::Range<'a, K, V>>>,
    removed: Option<&'a BTreeSet<K>>,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(modified) = self.modified.as_mut() else {
                return self.base.next();
            };
            let order = match (self.base.peek(), modified.peek()) {
                (None, None) => return None,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some((base_key, _)), Some((modified_key, _))) => base_key.cmp(modified_key),
            };
            match order {
                Ordering::Less => {
                    let entry = self.base.next();
                    let removed = self.removed;
                    if let Some(entry) = entry.filter(|(key, _)| !removed.is_some_and(|r| r.contains(key))) {
                        return Some(entry);
                    }
                }
                Ordering::Equal => {
                    self.base.next();
                    return modified.next();
                }
                Ordering::Greater => return modified.next(),
            }
        }
    }
}
