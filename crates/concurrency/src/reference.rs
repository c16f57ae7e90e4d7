//! Transactional single-value slot
//!
//! Holds an optional value; a staged transaction records the replacement.
//! Slots holding `Arc<P>` of another producer get the same child helpers as
//! `TransactionalMap`.

use crate::producer::TransactionalLayerProducer;
use crate::transaction::{Transaction, TransactionalLayerMaintainer};
use crate::writer::Writer;
use std::sync::Arc;
use tessera_core::{Identity, StructureId};

/// Pending replacement of a `TransactionalReference`
#[derive(Debug)]
pub struct ReferenceChange<T> {
    value: Option<T>,
}

/// Optional value whose replacement is staged in a transaction overlay
#[derive(Debug, Clone)]
pub struct TransactionalReference<T> {
    identity: Identity,
    value: Option<T>,
}

impl<T> Default for TransactionalReference<T> {
    fn default() -> Self {
        Self {
            identity: Identity::new(),
            value: None,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> TransactionalReference<T> {
    /// Slot holding `value`
    pub fn new(value: Option<T>) -> Self {
        Self {
            identity: Identity::new(),
            value,
        }
    }

    /// Current value through the transaction view
    pub fn get<'a>(&'a self, tx: Option<&'a Transaction>) -> Option<&'a T> {
        match tx.and_then(|tx| tx.layer::<ReferenceChange<T>>(self.structure_id())) {
            Some(change) => change.value.as_ref(),
            None => self.value.as_ref(),
        }
    }

    /// Replace the value
    pub fn set(writer: Writer<'_, Self>, value: Option<T>) {
        match writer {
            Writer::Direct(slot) => slot.value = value,
            Writer::Staged(slot, tx) => tx.get_or_create_layer(slot).value = value,
        }
    }
}

impl<P> TransactionalReference<Arc<P>>
where
    P: TransactionalLayerProducer + Clone + Send + Sync + 'static,
{
    /// Run `f` with write access to the held child, `None` when empty
    pub fn with_child<R>(writer: Writer<'_, Self>, f: impl FnOnce(Writer<'_, P>) -> R) -> Option<R> {
        match writer {
            Writer::Direct(slot) => slot
                .value
                .as_mut()
                .map(|child| f(Writer::Direct(Arc::make_mut(child)))),
            Writer::Staged(slot, tx) => {
                let child = Arc::clone(slot.get(Some(&*tx))?);
                tx.get_or_create_layer(slot).value = Some(Arc::clone(&child));
                Some(f(Writer::Staged(&child, tx)))
            }
        }
    }

    /// Like `with_child`, creating the child with `create` when empty
    pub fn with_child_or_create<R>(
        writer: Writer<'_, Self>,
        create: impl FnOnce() -> P,
        f: impl FnOnce(Writer<'_, P>) -> R,
    ) -> R {
        match writer {
            Writer::Direct(slot) => {
                let child = slot.value.get_or_insert_with(|| Arc::new(create()));
                f(Writer::Direct(Arc::make_mut(child)))
            }
            Writer::Staged(slot, tx) => {
                let child = match slot.get(Some(&*tx)) {
                    Some(child) => Arc::clone(child),
                    None => Arc::new(create()),
                };
                tx.get_or_create_layer(slot).value = Some(Arc::clone(&child));
                f(Writer::Staged(&child, tx))
            }
        }
    }

    /// Empty the slot, dropping the child's transactional memory.
    /// Returns `true` if a child was held.
    pub fn clear_child(writer: Writer<'_, Self>) -> bool {
        match writer {
            Writer::Direct(slot) => slot.value.take().is_some(),
            Writer::Staged(slot, tx) => {
                let Some(child) = slot.get(Some(&*tx)).map(Arc::clone) else {
                    return false;
                };
                child.clear_transactional_memory(tx);
                tx.get_or_create_layer(slot).value = None;
                true
            }
        }
    }

    /// Merged copy whose touched child is merged through `maintainer`
    pub fn merge_child(&self, maintainer: &mut TransactionalLayerMaintainer<'_>) -> Self {
        let value = match maintainer.take_layer::<ReferenceChange<Arc<P>>>(self.structure_id()) {
            None => self.value.clone(),
            Some(change) => change.value.map(|child| {
                Arc::new(maintainer.get_state_copy_with_committed_changes(child.as_ref()))
            }),
        };
        Self {
            identity: Identity::new(),
            value,
        }
    }

    /// Drop this slot's layer and the memory of a touched child
    pub fn clear_children(&self, tx: &mut Transaction) {
        if let Some(change) = tx.take_layer::<ReferenceChange<Arc<P>>>(self.structure_id()) {
            if let Some(child) = change.value {
                child.clear_transactional_memory(tx);
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> TransactionalLayerProducer for TransactionalReference<T> {
    type Layer = ReferenceChange<T>;

    fn structure_id(&self) -> StructureId {
        self.identity.id()
    }

    fn create_layer(&self) -> ReferenceChange<T> {
        ReferenceChange {
            value: self.value.clone(),
        }
    }

    fn create_copy_with_merged_transactional_memory(
        &self,
        layer: Option<ReferenceChange<T>>,
        _maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        Self {
            identity: Identity::new(),
            value: match layer {
                Some(change) => change.value,
                None => self.value.clone(),
            },
        }
    }
}
