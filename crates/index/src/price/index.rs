//! Price index: price buckets keyed by price list, currency and handling mode
//!
//! `PriceIndex<B>` is shared by both flavors; `B` decides where records
//! live and how internal price ids are obtained:
//!
//! | flavor            | bucket                          | records          | internal ids            |
//! |-------------------|---------------------------------|------------------|-------------------------|
//! | `PriceSuperIndex` | `PriceListAndCurrencySuperIndex` | owned            | drawn from the sequence |
//! | `PriceRefIndex`   | `PriceListAndCurrencyRefIndex`   | super index's    | supplied by the caller  |
//!
//! Buckets are created on the first added price and dropped with the last
//! removed one. Every operation checks its preconditions before it stages
//! any change.

use super::bucket::PriceListAndCurrencyIndex;
use super::mutation::PriceMutation;
use super::ref_bucket::PriceListAndCurrencyRefIndex;
use super::registry::SuperIndexHandle;
use super::sequence::InternalPriceIdSequence;
use super::super_bucket::PriceListAndCurrencySuperIndex;
use crate::storage_part::{PriceRefStoragePart, PriceSuperStoragePart};
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, Writer,
};
use tessera_core::{
    Bitmap, Identity, IndexConfig, IndexError, IndexResult, InternalPriceId, PriceIndexKey,
    PrimaryKey, StructureId,
};
use tracing::debug;

/// Price index owning its price records
pub type PriceSuperIndex = PriceIndex<PriceListAndCurrencySuperIndex>;

/// Price index sharing the records of a super index
pub type PriceRefIndex = PriceIndex<PriceListAndCurrencyRefIndex>;

/// Price buckets of one entity collection
#[derive(Debug, Clone)]
pub struct PriceIndex<B: PriceListAndCurrencyIndex> {
    identity: Identity,
    price_indexes: TransactionalMap<PriceIndexKey, Arc<B>>,
    shared: B::Shared,
}

impl<B: PriceListAndCurrencyIndex> PriceIndex<B> {
    fn with_buckets(shared: B::Shared, buckets: impl IntoIterator<Item = B>) -> Self {
        Self {
            identity: Identity::new(),
            price_indexes: buckets
                .into_iter()
                .map(|bucket| (bucket.key().clone(), Arc::new(bucket)))
                .collect(),
            shared,
        }
    }

    /// Bucket of `key`
    pub fn price_index<'a>(&'a self, tx: Option<&'a Transaction>, key: &PriceIndexKey) -> Option<&'a B> {
        self.price_indexes.get(tx, key).map(Arc::as_ref)
    }

    /// Buckets ordered by key
    pub fn price_indexes<'a>(&'a self, tx: Option<&'a Transaction>) -> impl Iterator<Item = &'a B> + 'a {
        self.price_indexes.values(tx).map(Arc::as_ref)
    }

    /// Check if the index holds no bucket
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.price_indexes.is_empty(tx)
    }

    /// Entities with a price in bucket `key`; empty when the bucket doesn't exist
    pub fn indexed_price_entity_ids(&self, tx: Option<&Transaction>, key: &PriceIndexKey) -> Bitmap {
        self.price_index(tx, key)
            .map(|bucket| bucket.core().indexed_price_entity_ids(tx))
            .unwrap_or_default()
    }

    /// Internal ids of prices in bucket `key` valid at `instant` (microseconds)
    pub fn indexed_record_ids_valid_at(
        &self,
        tx: Option<&Transaction>,
        key: &PriceIndexKey,
        instant: i64,
    ) -> Bitmap {
        self.price_index(tx, key)
            .map(|bucket| bucket.core().indexed_record_ids_valid_at(tx, instant))
            .unwrap_or_default()
    }

    /// Index a price and return its internal id.
    ///
    /// # Errors
    ///
    /// - `MissingInternalPriceId` when a ref index gets a price without one
    /// - `MissingPriceIndex` / `MissingPriceRecord` when a ref index's super
    ///   index doesn't hold the price
    /// - `PriceAlreadyIndexed` when the bucket already holds the internal id
    /// - `EmptyValidity` when the validity ends at or before its start
    /// - `InternalPriceIdsExhausted` when a super index has no id left
    pub fn add_price(
        writer: Writer<'_, Self>,
        source: &B::Source,
        mutation: &PriceMutation,
    ) -> IndexResult<InternalPriceId> {
        let key = mutation.index_key();
        let validity = mutation.effective_validity();
        if validity.is_empty() {
            return Err(IndexError::EmptyValidity {
                key,
                price_id: mutation.price_key.price_id,
                from: validity.lower_bound(),
                to: validity.upper_bound(),
            });
        }
        let index = writer.target();
        let internal_price_id = B::assign_internal_price_id(&index.shared, &key, mutation)?;
        let tx = writer.transaction();
        B::validate_add(index.price_index(tx, &key), tx, source, &key, internal_price_id)?;

        TransactionalMap::with_child_or_create(
            project!(writer, price_indexes),
            key.clone(),
            || {
                debug!(target: "tessera::price", %key, "Price bucket created");
                B::create(key.clone())
            },
            |bucket| B::add_price(bucket, source, internal_price_id, mutation),
        );
        Ok(internal_price_id)
    }

    /// Unindex a price; a bucket left empty is dropped.
    ///
    /// # Errors
    ///
    /// - `MissingInternalPriceId` when the mutation carries no internal id
    /// - `MissingPriceIndex` when the bucket doesn't exist
    /// - `PriceNotIndexed` when the bucket doesn't hold the internal id
    pub fn remove_price(
        mut writer: Writer<'_, Self>,
        source: &B::Source,
        mutation: &PriceMutation,
    ) -> IndexResult<()> {
        let key = mutation.index_key();
        let internal_price_id = mutation
            .internal_price_id
            .ok_or_else(|| IndexError::MissingInternalPriceId(key.clone()))?;
        let tx = writer.transaction();
        writer
            .target()
            .price_index(tx, &key)
            .ok_or_else(|| IndexError::MissingPriceIndex(key.clone()))?
            .validate_remove(tx, internal_price_id)?;

        TransactionalMap::with_child(project!(writer.reborrow(), price_indexes), &key, |bucket| {
            B::remove_price(bucket, source, internal_price_id, mutation)
        });

        let tx = writer.transaction();
        let emptied = writer
            .target()
            .price_index(tx, &key)
            .is_some_and(|bucket| bucket.core().is_empty(tx));
        if emptied {
            TransactionalMap::remove_child(project!(writer, price_indexes), &key);
            debug!(target: "tessera::price", %key, "Price bucket removed");
        }
        Ok(())
    }

    /// Keys of buckets changed since the last `reset_dirty`
    pub fn dirty_keys<'a>(&'a self, tx: Option<&'a Transaction>) -> impl Iterator<Item = &'a PriceIndexKey> + 'a {
        self.price_indexes(tx)
            .filter(move |bucket| bucket.core().is_dirty(tx))
            .map(|bucket| bucket.key())
    }

    /// Clear the dirty flag of every dirty bucket after a successful flush
    pub fn reset_dirty(mut writer: Writer<'_, Self>) {
        let dirty: Vec<PriceIndexKey> = writer
            .target()
            .dirty_keys(writer.transaction())
            .cloned()
            .collect();
        for key in &dirty {
            TransactionalMap::with_child(
                project!(writer.reborrow(), price_indexes),
                key,
                B::reset_dirty,
            );
        }
    }
}

impl PriceSuperIndex {
    /// Empty super index drawing ids from `config.first_internal_price_id`
    pub fn new(config: &IndexConfig) -> Self {
        let sequence = InternalPriceIdSequence::starting_at(config.first_internal_price_id);
        Self::with_buckets(Arc::new(sequence), [])
    }

    /// Rebuild from persisted buckets; the sequence continues after the
    /// highest stored internal id.
    ///
    /// # Errors
    ///
    /// `InternalPriceIdsExhausted` when a stored id is already `u32::MAX`.
    pub fn from_storage_parts<'p>(
        config: &IndexConfig,
        parts: impl IntoIterator<Item = &'p PriceSuperStoragePart>,
    ) -> IndexResult<Self> {
        let buckets: Vec<PriceListAndCurrencySuperIndex> = parts
            .into_iter()
            .map(PriceListAndCurrencySuperIndex::from_storage_part)
            .collect();
        let first = match buckets
            .iter()
            .filter_map(|bucket| bucket.max_internal_price_id(None))
            .max()
        {
            Some(max) => max
                .checked_add(1)
                .ok_or(IndexError::InternalPriceIdsExhausted)?
                .max(config.first_internal_price_id),
            None => config.first_internal_price_id,
        };
        debug!(target: "tessera::price", buckets = buckets.len(), first, "Super index loaded");
        Ok(Self::with_buckets(
            Arc::new(InternalPriceIdSequence::starting_at(first)),
            buckets,
        ))
    }

    /// Sequence the super index draws internal ids from
    pub fn internal_price_id_sequence(&self) -> &InternalPriceIdSequence {
        &self.shared
    }

    /// Storage parts of every dirty bucket
    pub fn create_storage_parts(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> Vec<PriceSuperStoragePart> {
        self.price_indexes(tx)
            .filter(|bucket| bucket.core().is_dirty(tx))
            .map(|bucket| bucket.create_storage_part(tx, owner_primary_key))
            .collect()
    }
}

impl PriceRefIndex {
    /// Empty ref index resolving records through `super_index`
    pub fn new(super_index: SuperIndexHandle) -> Self {
        Self::with_buckets(super_index, [])
    }

    /// Rebuild from persisted buckets against `source`, the super index
    /// registered under `super_index`.
    pub fn from_storage_parts<'p>(
        super_index: SuperIndexHandle,
        source: &PriceSuperIndex,
        parts: impl IntoIterator<Item = &'p PriceRefStoragePart>,
    ) -> IndexResult<Self> {
        let buckets = parts
            .into_iter()
            .map(|part| PriceListAndCurrencyRefIndex::from_storage_part(part, source))
            .collect::<IndexResult<Vec<_>>>()?;
        Ok(Self::with_buckets(super_index, buckets))
    }

    /// Registry handle of the super index records are resolved through
    pub fn super_index(&self) -> SuperIndexHandle {
        self.shared
    }

    /// Resolve records through another super index
    pub fn rebind(&mut self, super_index: SuperIndexHandle) {
        self.shared = super_index;
    }

    /// Storage parts of every dirty bucket
    pub fn create_storage_parts(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> Vec<PriceRefStoragePart> {
        self.price_indexes(tx)
            .filter(|bucket| bucket.core().is_dirty(tx))
            .map(|bucket| bucket.create_storage_part(tx, owner_primary_key))
            .collect()
    }
}

impl<B: PriceListAndCurrencyIndex> TransactionalLayerProducer for PriceIndex<B> {
    type Layer = ();

    fn structure_id(&self) -> StructureId {
        self.identity.id()
    }

    fn create_layer(&self) {}

    fn create_copy_with_merged_transactional_memory(
        &self,
        _layer: Option<()>,
        maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        debug!(
            target: "tessera::price",
            txn_id = maintainer.transaction_id(),
            structure = %self.identity.id(),
            "Merging price index"
        );
        Self {
            identity: Identity::new(),
            price_indexes: self.price_indexes.merge_children(maintainer),
            shared: self.shared.clone(),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.price_indexes.clear_children(transaction);
    }
}
