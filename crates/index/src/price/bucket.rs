//! State and contract shared by super and ref price buckets

use super::mutation::PriceMutation;
use crate::range::{RangeIndex, RangePointSnapshot};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalBitmap, TransactionalLayerMaintainer,
    TransactionalLayerProducer, TransactionalReference, Writer,
};
use tessera_core::{
    Bitmap, DateTimeRange, IndexResult, InternalPriceId, PriceIndexKey, PriceRecord, PrimaryKey,
};

/// Id bitmaps, validity index and dirty flag of one bucket
#[derive(Debug, Clone, Default)]
pub struct PriceBucketCore {
    indexed_price_entity_ids: TransactionalBitmap,
    indexed_price_ids: TransactionalBitmap,
    validity_index: RangeIndex,
    dirty: TransactionalReference<bool>,
    /// Base price ids, filled on the first read outside a transaction
    price_ids_cache: OnceCell<Arc<[InternalPriceId]>>,
}

impl PriceBucketCore {
    /// Core rebuilt from persisted state
    pub fn from_parts(
        entity_ids: impl IntoIterator<Item = PrimaryKey>,
        price_ids: impl IntoIterator<Item = InternalPriceId>,
        validity: &[RangePointSnapshot],
    ) -> Self {
        Self {
            indexed_price_entity_ids: TransactionalBitmap::from_values(entity_ids),
            indexed_price_ids: TransactionalBitmap::from_values(price_ids),
            validity_index: RangeIndex::from_snapshots(validity),
            dirty: TransactionalReference::default(),
            price_ids_cache: OnceCell::new(),
        }
    }

    /// Entities with at least one price in the bucket
    pub fn indexed_price_entity_ids(&self, tx: Option<&Transaction>) -> Bitmap {
        self.indexed_price_entity_ids.bitmap(tx)
    }

    /// Internal ids of the prices in the bucket, sorted.
    ///
    /// Outside a transaction the array is computed once per base; within one
    /// it reflects the staged changes and is never cached.
    pub fn indexed_price_ids(&self, tx: Option<&Transaction>) -> Arc<[InternalPriceId]> {
        match tx {
            None => Arc::clone(
                self.price_ids_cache
                    .get_or_init(|| self.indexed_price_ids.to_array(None).into()),
            ),
            Some(_) => self.indexed_price_ids.to_array(tx).into(),
        }
    }

    /// Check if the bucket indexes `internal_price_id`
    pub fn contains_price(&self, tx: Option<&Transaction>, internal_price_id: InternalPriceId) -> bool {
        self.indexed_price_ids.contains(tx, internal_price_id)
    }

    /// Check if `entity` has a price in the bucket
    pub fn contains_entity(&self, tx: Option<&Transaction>, entity: PrimaryKey) -> bool {
        self.indexed_price_entity_ids.contains(tx, entity)
    }

    /// Internal ids of the prices valid at `instant` (microseconds)
    pub fn indexed_record_ids_valid_at(&self, tx: Option<&Transaction>, instant: i64) -> Bitmap {
        self.validity_index.records_valid_at(tx, instant)
    }

    /// Internal ids of the prices whose validity intersects `range`
    pub fn indexed_record_ids_overlapping(
        &self,
        tx: Option<&Transaction>,
        range: &DateTimeRange,
    ) -> Bitmap {
        self.validity_index
            .records_overlapping(tx, range.lower_bound(), range.upper_bound())
    }

    /// Persisted form of the validity index
    pub fn validity_snapshots(&self, tx: Option<&Transaction>) -> Vec<RangePointSnapshot> {
        self.validity_index.snapshots(tx)
    }

    /// Check if the bucket indexes no price
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.indexed_price_ids.is_empty(tx)
    }

    /// Check if the bucket changed since the last `reset_dirty`
    pub fn is_dirty(&self, tx: Option<&Transaction>) -> bool {
        self.dirty.get(tx).copied().unwrap_or(false)
    }

    /// Index price `internal_price_id` of `entity`
    pub fn add(
        mut writer: Writer<'_, Self>,
        entity: PrimaryKey,
        internal_price_id: InternalPriceId,
        validity: &DateTimeRange,
    ) {
        Self::invalidate_cache(&mut writer);
        TransactionalBitmap::add(project!(writer.reborrow(), indexed_price_entity_ids), entity);
        TransactionalBitmap::add(project!(writer.reborrow(), indexed_price_ids), internal_price_id);
        RangeIndex::add_range(project!(writer.reborrow(), validity_index), validity, internal_price_id);
        TransactionalReference::set(project!(writer, dirty), Some(true));
    }

    /// Unindex price `internal_price_id`; `entity` is dropped only when
    /// `entity_retains_prices` is false
    pub fn remove(
        mut writer: Writer<'_, Self>,
        entity: PrimaryKey,
        entity_retains_prices: bool,
        internal_price_id: InternalPriceId,
        validity: &DateTimeRange,
    ) {
        Self::invalidate_cache(&mut writer);
        TransactionalBitmap::remove(project!(writer.reborrow(), indexed_price_ids), internal_price_id);
        if !entity_retains_prices {
            TransactionalBitmap::remove(project!(writer.reborrow(), indexed_price_entity_ids), entity);
        }
        RangeIndex::remove_range(project!(writer.reborrow(), validity_index), validity, internal_price_id);
        TransactionalReference::set(project!(writer, dirty), Some(true));
    }

    /// Clear the dirty flag
    pub fn reset_dirty(writer: Writer<'_, Self>) {
        TransactionalReference::set(project!(writer, dirty), Some(false));
    }

    fn invalidate_cache(writer: &mut Writer<'_, Self>) {
        if let Writer::Direct(core) = writer {
            core.price_ids_cache = OnceCell::new();
        }
    }

    /// Merged copy of the core, consuming the layers of its containers
    pub fn merged(&self, maintainer: &mut TransactionalLayerMaintainer<'_>) -> Self {
        Self {
            indexed_price_entity_ids: maintainer
                .get_state_copy_with_committed_changes(&self.indexed_price_entity_ids),
            indexed_price_ids: maintainer.get_state_copy_with_committed_changes(&self.indexed_price_ids),
            validity_index: maintainer.get_state_copy_with_committed_changes(&self.validity_index),
            dirty: maintainer.get_state_copy_with_committed_changes(&self.dirty),
            price_ids_cache: OnceCell::new(),
        }
    }

    /// Drop the layers of the core's containers
    pub fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.indexed_price_entity_ids
            .clear_transactional_memory(transaction);
        self.indexed_price_ids.clear_transactional_memory(transaction);
        self.validity_index.clear_transactional_memory(transaction);
        self.dirty.clear_transactional_memory(transaction);
    }
}

/// One price list and currency bucket, in its super or ref flavor
///
/// Validation and mutation are split so that a price index can check every
/// precondition before it stages anything.
pub trait PriceListAndCurrencyIndex:
    TransactionalLayerProducer + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Structure read while mutating: nothing for super buckets, the super
    /// price index for ref buckets
    type Source;

    /// State shared by all buckets of one price index and its merged copies
    type Shared: Clone + fmt::Debug + Send + Sync;

    /// Empty bucket
    fn create(key: PriceIndexKey) -> Self;

    /// Bucket key
    fn key(&self) -> &PriceIndexKey;

    /// Id bitmaps and validity index
    fn core(&self) -> &PriceBucketCore;

    /// Internal id the added price is indexed under
    fn assign_internal_price_id(
        shared: &Self::Shared,
        key: &PriceIndexKey,
        mutation: &PriceMutation,
    ) -> IndexResult<InternalPriceId>;

    /// Check that the price can be added; `bucket` is `None` when it doesn't exist yet
    fn validate_add(
        bucket: Option<&Self>,
        tx: Option<&Transaction>,
        source: &Self::Source,
        key: &PriceIndexKey,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()>;

    /// Index a validated price
    fn add_price(
        writer: Writer<'_, Self>,
        source: &Self::Source,
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    );

    /// Check that the price can be removed
    fn validate_remove(
        &self,
        tx: Option<&Transaction>,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()>;

    /// Unindex a validated price
    fn remove_price(
        writer: Writer<'_, Self>,
        source: &Self::Source,
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    );

    /// Record of `internal_price_id`, if the bucket indexes it
    fn price_record<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        source: &'a Self::Source,
        internal_price_id: InternalPriceId,
    ) -> Option<&'a Arc<PriceRecord>>;

    /// Records of the bucket ordered by internal id
    fn price_records(&self, tx: Option<&Transaction>, source: &Self::Source) -> Vec<Arc<PriceRecord>> {
        self.core()
            .indexed_price_ids(tx)
            .iter()
            .filter_map(|&id| self.price_record(tx, source, id).cloned())
            .collect()
    }

    /// Clear the dirty flag
    fn reset_dirty(writer: Writer<'_, Self>);
}
