//! Transaction overlay side-table
//!
//! A `Transaction` maps structure ids to pending-diff layers. Nothing else
//! holds transactional state: structures read their layer from the
//! transaction handed to them, and a structure that is never touched never
//! gets a layer.
//!
//! ## Lifecycle
//!
//! ```text
//! Transaction::new()
//!   -> staged writes create layers lazily (Writer::Staged)
//!   -> commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&root))
//!        every layer is taken out exactly once and folded into a new base
//!   or rollback()
//!        layers are dropped, bases were never touched
//! ```

use crate::producer::TransactionalLayerProducer;
use rustc_hash::FxHashMap;
use std::any::{type_name, Any};
use std::sync::atomic::{AtomicU64, Ordering};
use tessera_core::{IndexConfig, IndexError, IndexResult, StructureId};
use tracing::{debug, warn};

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

type Layer = Box<dyn Any + Send + Sync>;

/// Per-transaction side-table of overlay layers
pub struct Transaction {
    /// Unique transaction id
    id: u64,
    /// Structure id -> pending diff
    layers: FxHashMap<StructureId, Layer>,
    /// Whether commit rejects leftover layers
    fail_on_unconsumed_layers: bool,
}

impl Transaction {
    /// Open a transaction with default configuration
    pub fn new() -> Self {
        Self::with_config(&IndexConfig::default())
    }

    /// Open a transaction honoring `config`
    pub fn with_config(config: &IndexConfig) -> Self {
        let id = NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed);
        debug!(target: "tessera::txn", txn_id = id, "Transaction started");
        Self {
            id,
            layers: FxHashMap::default(),
            fail_on_unconsumed_layers: config.fail_on_unconsumed_layers,
        }
    }

    /// Transaction id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of layers currently held
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Check if a layer exists for `id`
    pub fn has_layer(&self, id: StructureId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Layer of structure `id`, if one was created
    pub fn layer<L: Any>(&self, id: StructureId) -> Option<&L> {
        self.layers.get(&id).map(|layer| {
            layer
                .downcast_ref::<L>()
                .unwrap_or_else(|| layer_type_mismatch::<L>(id))
        })
    }

    /// Mutable layer of structure `id`, if one was created
    pub fn layer_mut<L: Any>(&mut self, id: StructureId) -> Option<&mut L> {
        self.layers.get_mut(&id).map(|layer| {
            layer
                .downcast_mut::<L>()
                .unwrap_or_else(|| layer_type_mismatch::<L>(id))
        })
    }

    /// Layer of `producer`, created on demand
    pub fn get_or_create_layer<P: TransactionalLayerProducer>(
        &mut self,
        producer: &P,
    ) -> &mut P::Layer {
        let id = producer.structure_id();
        self.layers
            .entry(id)
            .or_insert_with(|| Box::new(producer.create_layer()))
            .downcast_mut::<P::Layer>()
            .unwrap_or_else(|| layer_type_mismatch::<P::Layer>(id))
    }

    /// Remove and return the layer of structure `id`
    pub fn take_layer<L: Any>(&mut self, id: StructureId) -> Option<L> {
        self.layers.remove(&id).map(|layer| match layer.downcast::<L>() {
            Ok(layer) => *layer,
            Err(_) => layer_type_mismatch::<L>(id),
        })
    }

    /// Drop the layer of structure `id`. Returns `true` if one existed.
    pub fn remove_layer_if_exists(&mut self, id: StructureId) -> bool {
        self.layers.remove(&id).is_some()
    }

    /// Fold the layers into new bases.
    ///
    /// `merge` receives the maintainer and asks it for merged copies of every
    /// root structure touched by this transaction. Layers left behind after
    /// `merge` returns were staged against structures nobody merged.
    ///
    /// # Errors
    ///
    /// `UnconsumedLayers` when leftover layers exist and the transaction was
    /// opened with `fail_on_unconsumed_layers`.
    pub fn commit<R>(
        mut self,
        merge: impl FnOnce(&mut TransactionalLayerMaintainer<'_>) -> R,
    ) -> IndexResult<R> {
        let result = merge(&mut TransactionalLayerMaintainer {
            transaction: &mut self,
        });

        let leftover = self.layers.len();
        if leftover > 0 {
            warn!(
                target: "tessera::txn",
                txn_id = self.id,
                leftover,
                "Commit left transactional layers unconsumed"
            );
            if self.fail_on_unconsumed_layers {
                return Err(IndexError::UnconsumedLayers {
                    txn_id: self.id,
                    count: leftover,
                });
            }
        }

        debug!(target: "tessera::txn", txn_id = self.id, "Transaction committed");
        Ok(result)
    }

    /// Discard every staged change. Returns the number of dropped layers.
    pub fn rollback(self) -> usize {
        let dropped = self.layers.len();
        debug!(target: "tessera::txn", txn_id = self.id, dropped, "Transaction rolled back");
        dropped
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("layers", &self.layers.len())
            .finish()
    }
}

// Ids are unique per instance and each producer type has one layer type, so a
// mismatch means two structures share an id.
fn layer_type_mismatch<L>(id: StructureId) -> ! {
    panic!(
        "overlay layer of structure {} is not a {}",
        id,
        type_name::<L>()
    )
}

/// Commit-time access to a transaction's layers
///
/// Handed to `create_copy_with_merged_transactional_memory` so producers can
/// merge their children.
pub struct TransactionalLayerMaintainer<'t> {
    transaction: &'t mut Transaction,
}

impl<'t> TransactionalLayerMaintainer<'t> {
    /// Id of the committing transaction
    pub fn transaction_id(&self) -> u64 {
        self.transaction.id
    }

    /// Merged copy of `producer`, consuming its layer
    pub fn get_state_copy_with_committed_changes<P: TransactionalLayerProducer>(
        &mut self,
        producer: &P,
    ) -> P {
        let layer = self.take_layer::<P::Layer>(producer.structure_id());
        producer.create_copy_with_merged_transactional_memory(layer, self)
    }

    /// Take the layer of structure `id` out of the transaction
    pub fn take_layer<L: Any>(&mut self, id: StructureId) -> Option<L> {
        self.transaction.take_layer(id)
    }

    /// Drop the layers of `producer` and its children without merging them
    pub fn remove_transactional_memory_layer_if_exists<P: TransactionalLayerProducer>(
        &mut self,
        producer: &P,
    ) {
        producer.clear_transactional_memory(self.transaction);
    }
}
