//! Price bucket sharing the records of a super bucket

use super::bucket::{PriceBucketCore, PriceListAndCurrencyIndex};
use super::index::PriceSuperIndex;
use super::mutation::PriceMutation;
use super::registry::SuperIndexHandle;
use super::super_bucket::PriceListAndCurrencySuperIndex;
use crate::storage_part::PriceRefStoragePart;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer, Writer,
};
use tessera_core::{
    DateTimeRange, Identity, IndexError, IndexResult, InternalPriceId, PriceIndexKey, PriceRecord, PrimaryKey,
    StructureId,
};

/// Ref bucket: mirrors ids and validity of a subset of a super bucket's prices
///
/// Records are never copied; they are resolved by internal id in the super
/// bucket of the same key.
#[derive(Debug, Clone)]
pub struct PriceListAndCurrencyRefIndex {
    identity: Identity,
    key: PriceIndexKey,
    core: PriceBucketCore,
}

impl PriceListAndCurrencyRefIndex {
    /// Bucket rebuilt from its storage part; entity ids are re-derived from
    /// the records of `super_index`.
    ///
    /// # Errors
    ///
    /// `MissingPriceIndex` / `MissingPriceRecord` when the super index
    /// doesn't hold a referenced price.
    pub fn from_storage_part(
        part: &PriceRefStoragePart,
        super_index: &PriceSuperIndex,
    ) -> IndexResult<Self> {
        let linked = linked_bucket(None, super_index, &part.key)?;
        let mut entity_ids = Vec::with_capacity(part.price_ids.len());
        for &internal_price_id in &part.price_ids {
            entity_ids.push(resolve(None, linked, internal_price_id)?.entity_primary_key);
        }
        Ok(Self {
            identity: Identity::new(),
            key: part.key.clone(),
            core: PriceBucketCore::from_parts(entity_ids, part.price_ids.iter().copied(), &part.validity),
        })
    }

    /// Persisted form of the bucket
    pub fn create_storage_part(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> PriceRefStoragePart {
        PriceRefStoragePart {
            owner_primary_key,
            key: self.key.clone(),
            price_ids: self.core.indexed_price_ids(tx).to_vec(),
            validity: self.core.validity_snapshots(tx),
        }
    }
}

fn linked_bucket<'a>(
    tx: Option<&'a Transaction>,
    super_index: &'a PriceSuperIndex,
    key: &PriceIndexKey,
) -> IndexResult<&'a PriceListAndCurrencySuperIndex> {
    super_index
        .price_index(tx, key)
        .ok_or_else(|| IndexError::MissingPriceIndex(key.clone()))
}

fn resolve<'a>(
    tx: Option<&'a Transaction>,
    bucket: &'a PriceListAndCurrencySuperIndex,
    internal_price_id: InternalPriceId,
) -> IndexResult<&'a Arc<PriceRecord>> {
    bucket
        .price_record(tx, &(), internal_price_id)
        .ok_or_else(|| IndexError::MissingPriceRecord {
            key: bucket.key().clone(),
            internal_price_id,
        })
}

/// Entity and validity of the super record, or of the mutation when the
/// super bucket no longer holds it
fn indexed_as(
    writer: &Writer<'_, PriceListAndCurrencyRefIndex>,
    source: &PriceSuperIndex,
    internal_price_id: InternalPriceId,
    mutation: &PriceMutation,
) -> (PrimaryKey, DateTimeRange) {
    let tx = writer.transaction();
    linked_bucket(tx, source, &writer.target().key)
        .and_then(|bucket| resolve(tx, bucket, internal_price_id))
        .map_or(
            (mutation.entity_primary_key, mutation.effective_validity()),
            |record| (record.entity_primary_key, record.validity),
        )
}

impl PriceListAndCurrencyIndex for PriceListAndCurrencyRefIndex {
    type Source = PriceSuperIndex;
    type Shared = SuperIndexHandle;

    fn create(key: PriceIndexKey) -> Self {
        Self {
            identity: Identity::new(),
            key,
            core: PriceBucketCore::default(),
        }
    }

    fn key(&self) -> &PriceIndexKey {
        &self.key
    }

    fn core(&self) -> &PriceBucketCore {
        &self.core
    }

    fn assign_internal_price_id(
        _shared: &SuperIndexHandle,
        key: &PriceIndexKey,
        mutation: &PriceMutation,
    ) -> IndexResult<InternalPriceId> {
        mutation
            .internal_price_id
            .ok_or_else(|| IndexError::MissingInternalPriceId(key.clone()))
    }

    fn validate_add(
        bucket: Option<&Self>,
        tx: Option<&Transaction>,
        source: &PriceSuperIndex,
        key: &PriceIndexKey,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()> {
        resolve(tx, linked_bucket(tx, source, key)?, internal_price_id)?;
        if bucket.is_some_and(|bucket| bucket.core.contains_price(tx, internal_price_id)) {
            return Err(IndexError::PriceAlreadyIndexed {
                key: key.clone(),
                internal_price_id,
            });
        }
        Ok(())
    }

    fn add_price(
        writer: Writer<'_, Self>,
        source: &PriceSuperIndex,
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    ) {
        let (entity, validity) = indexed_as(&writer, source, internal_price_id, mutation);
        PriceBucketCore::add(project!(writer, core), entity, internal_price_id, &validity);
    }

    fn validate_remove(
        &self,
        tx: Option<&Transaction>,
        internal_price_id: InternalPriceId,
    ) -> IndexResult<()> {
        if !self.core.contains_price(tx, internal_price_id) {
            return Err(IndexError::PriceNotIndexed {
                key: self.key.clone(),
                internal_price_id,
            });
        }
        Ok(())
    }

    fn remove_price(
        writer: Writer<'_, Self>,
        source: &PriceSuperIndex,
        internal_price_id: InternalPriceId,
        mutation: &PriceMutation,
    ) {
        let tx = writer.transaction();
        let (entity, validity) = indexed_as(&writer, source, internal_price_id, mutation);
        // Scope stays this bucket: other prices of the entity in the super
        // bucket count only while this bucket still mirrors them.
        let retains_prices = linked_bucket(tx, source, &writer.target().key).is_ok_and(|bucket| {
            bucket
                .entity_price_ids(tx, entity)
                .iter()
                .any(|&id| id != internal_price_id && writer.target().core.contains_price(tx, id))
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
        source: &'a PriceSuperIndex,
        internal_price_id: InternalPriceId,
    ) -> Option<&'a Arc<PriceRecord>> {
        if !self.core.contains_price(tx, internal_price_id) {
            return None;
        }
        source
            .price_index(tx, &self.key)?
            .price_record(tx, &(), internal_price_id)
    }

    fn reset_dirty(writer: Writer<'_, Self>) {
        PriceBucketCore::reset_dirty(project!(writer, core));
    }
}

impl TransactionalLayerProducer for PriceListAndCurrencyRefIndex {
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
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.core.clear_transactional_memory(transaction);
    }
}
