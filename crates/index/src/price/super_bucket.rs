//! Price bucket owning its price records

use super::bucket::{PriceBucketCore, PriceListAndCurrencyIndex};
use super::mutation::PriceMutation;
use super::sequence::InternalPriceIdSequence;
use crate::storage_part::PriceSuperStoragePart;
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, Writer,
};
use tessera_core::array::{insert_sorted, remove_sorted};
use tessera_core::{
    Identity, IndexError, IndexResult, InternalPriceId, PriceIndexKey, PriceRecord, PrimaryKey,
    StructureId,
};

/// Super bucket: canonical `PriceRecord`s of one price list and currency
#[derive(Debug, Clone)]
pub struct PriceListAndCurrencySuperIndex {
    identity: Identity,
    key: PriceIndexKey,
    core: PriceBucketCore,
    price_records: TransactionalMap<InternalPriceId, Arc<PriceRecord>>,
    /// entity -> sorted internal ids of its prices in this bucket
    entity_prices: TransactionalMap<PrimaryKey, Vec<InternalPriceId>>,
}

impl PriceListAndCurrencySuperIndex {
    /// Bucket rebuilt from its storage part
    pub fn from_storage_part(part: &PriceSuperStoragePart) -> Self {
        let mut entity_prices = BTreeMap::<PrimaryKey, Vec<InternalPriceId>>::new();
        for record in &part.price_records {
            insert_sorted(
                entity_prices.entry(record.entity_primary_key).or_default(),
                record.internal_price_id,
            );
        }

        Self {
            identity: Identity::new(),
            key: part.key.clone(),
            core: PriceBucketCore::from_parts(
                entity_prices.keys().copied(),
                part.price_records.iter().map(|record| record.internal_price_id),
                &part.validity,
            ),
            price_records: part
                .price_records
                .iter()
                .map(|record| (record.internal_price_id, Arc::new(record.clone())))
                .collect(),
            entity_prices: entity_prices.into_iter().collect(),
        }
    }

    /// Persisted form of the bucket
    pub fn create_storage_part(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> PriceSuperStoragePart {
        PriceSuperStoragePart {
            owner_primary_key,
            key: self.key.clone(),
            price_records: self
                .price_records
                .values(tx)
                .map(|record| record.as_ref().clone())
                .collect(),
            validity: self.core.validity_snapshots(tx),
        }
    }

    /// Sorted internal ids of the prices `entity` has in this bucket
    pub fn entity_price_ids<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        entity: PrimaryKey,
    ) -> &'a [InternalPriceId] {
        self.entity_prices
            .get(tx, &entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Highest internal id stored in the bucket
    pub fn max_internal_price_id(&self, tx: Option<&Transaction>) -> Option<InternalPriceId> {
        self.price_records.keys(tx).last().copied()
    }
}

impl PriceListAndCurrencyIndex for PriceListAndCurrencySuperIndex {
    type Source = ();
    type Shared = Arc<InternalPriceIdSequence>;

    fn create(key: PriceIndexKey) -> Self {
        Self {
            identity: Identity::new(),
            key,
            core: PriceBucketCore::default(),
            price_records: TransactionalMap::new(),
            entity_prices: TransactionalMap::new(),
        }
    }

    fn key(&self) -> &PriceIndexKey {
        &self.key
    }

    fn core(&self) -> &PriceBucketCore {
        &self.core
    }

    fn assign_internal_price_id(
        shared: &Arc<InternalPriceIdSequence>,
        _key: &PriceIndexKey,
        mutation: &PriceMutation,
    ) -> IndexResult<InternalPriceId> {
        match mutation.internal_price_id {
            Some(internal_price_id) => Ok(internal_price_id),
            None => shared.next_id(),
        }
    }

    fn validate_add(
        bucket: Option<&Self>,
        tx: Option<&Transaction>,
        _source: &(),
        key: &PriceIndexKey,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()> {
        if bucket.is_some_and(|bucket| bucket.price_records.contains_key(tx, &internal_price_id)) {
            return Err(IndexError::PriceAlreadyIndexed {
                key: key.clone(),
                internal_price_id,
            });
        }
        Ok(())
    }

    fn add_price(
        mut writer: Writer<'_, Self>,
        _source: &(),
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    ) {
        let entity = mutation.entity_primary_key;
        let validity = mutation.effective_validity();
        let record = match mutation.inner_record_id {
            Some(inner_record_id) => PriceRecord::with_inner_record(
                internal_price_id,
                mutation.price_key.price_id,
                entity,
                inner_record_id,
                mutation.price_with_tax,
                mutation.price_without_tax,
            ),
            None => PriceRecord::new(
                internal_price_id,
                mutation.price_key.price_id,
                entity,
                mutation.price_with_tax,
                mutation.price_without_tax,
            ),
        }
        .valid_in(validity);

        TransactionalMap::insert(
            project!(writer.reborrow(), price_records),
            internal_price_id,
            Arc::new(record),
        );
        TransactionalMap::compute(project!(writer.reborrow(), entity_prices), entity, |ids| {
            let mut ids = ids.cloned().unwrap_or_default();
            insert_sorted(&mut ids, internal_price_id);
            Some(ids)
        });
        PriceBucketCore::add(project!(writer, core), entity, internal_price_id, &validity);
    }

    fn validate_remove(
        &self,
        tx: Option<&Transaction>,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()> {
        if !self.price_records.contains_key(tx, &internal_price_id) {
            return Err(IndexError::PriceNotIndexed {
                key: self.key.clone(),
                internal_price_id,
            });
        }
        Ok(())
    }

    fn remove_price(
        mut writer: Writer<'_, Self>,
        _source: &(),
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    ) {
        let tx = writer.transaction();
        let (entity, validity) = writer
            .target()
            .price_records
            .get(tx, &internal_price_id)
            .map_or(
                (mutation.entity_primary_key, mutation.effective_validity()),
                |record| (record.entity_primary_key, record.validity),
            );

        TransactionalMap::remove(project!(writer.reborrow(), price_records), &internal_price_id);
        let mut retains_prices = false;
        TransactionalMap::compute(project!(writer.reborrow(), entity_prices), entity, |ids| {
            let mut ids = ids?.clone();
            remove_sorted(&mut ids, internal_price_id);
            retains_prices = !ids.is_empty();
            retains_prices.then_some(ids)
        });
        PriceBucketCore::remove(
            project!(writer, core),
            entity,
            retains_prices,
            internal_price_id,
            &validity,
        );
    }

    fn price_record<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        _source: &'a (),
        internal_price_id: InternalPriceId,
    ) -> Option<&'a Arc<PriceRecord>> {
        self.price_records.get(tx, &internal_price_id)
    }

    fn price_records(&self, tx: Option<&Transaction>, _source: &()) -> Vec<Arc<PriceRecord>> {
        self.price_records.values(tx).cloned().collect()
    }

    fn reset_dirty(writer: Writer<'_, Self>) {
        PriceBucketCore::reset_dirty(project!(writer, core));
    }
}

impl TransactionalLayerProducer for PriceListAndCurrencySuperIndex {
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
        Self {
            identity: Identity::new(),
            key: self.key.clone(),
            core: self.core.merged(maintainer),
            price_records: maintainer.get_state_copy_with_committed_changes(&self.price_records),
            entity_prices: maintainer.get_state_copy_with_committed_changes(&self.entity_prices),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.core.clear_transactional_memory(transaction);
        self.price_records.clear_transactional_memory(transaction);
        self.entity_prices.clear_transactional_memory(transaction);
    }
}
