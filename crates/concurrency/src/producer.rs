//! Contract of a structure that stages changes in a transaction overlay

use crate::transaction::{Transaction, TransactionalLayerMaintainer};
use std::any::Any;
use tessera_core::StructureId;

/// A structure whose pending changes live in a transaction layer
///
/// The layer is created lazily on the first staged mutation
/// (`Transaction::get_or_create_layer`) and consumed exactly once at commit
/// by `create_copy_with_merged_transactional_memory`, which folds the
/// untouched base and the layer into a brand new instance.
///
/// Structures that keep all their state in owned transactional containers
/// use `()` as their layer and never create one; their merge asks the
/// maintainer for merged copies of the containers instead.
pub trait TransactionalLayerProducer {
    /// Pending-diff type stored in the transaction side-table
    type Layer: Any + Send + Sync;

    /// Identity keying this structure's layer
    fn structure_id(&self) -> StructureId;

    /// Fresh, empty layer
    fn create_layer(&self) -> Self::Layer;

    /// Build the new base from this base and its layer (if one was created).
    ///
    /// Child producers are merged through `maintainer`.
    fn create_copy_with_merged_transactional_memory(
        &self,
        layer: Option<Self::Layer>,
        maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self
    where
        Self: Sized;

    /// Drop this structure's layer and, recursively, the layers of its children.
    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        transaction.remove_layer_if_exists(self.structure_id());
    }
}
