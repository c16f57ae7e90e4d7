//! Entities referencing one facet

use tessera_concurrency::{
    project, Transaction, TransactionalBitmap, TransactionalLayerMaintainer,
    TransactionalLayerProducer, Writer,
};
use tessera_core::{Bitmap, Identity, PrimaryKey, StructureId};

/// Bitmap of entity primary keys referencing `facet_id`
#[derive(Debug, Clone)]
pub struct FacetIdIndex {
    identity: Identity,
    facet_id: PrimaryKey,
    records: TransactionalBitmap,
}

impl FacetIdIndex {
    /// Index without any referencing entity
    pub fn new(facet_id: PrimaryKey) -> Self {
        Self::with_records(facet_id, [])
    }

    /// Index preloaded with `entity_ids`
    pub fn with_records(facet_id: PrimaryKey, entity_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            identity: Identity::new(),
            facet_id,
            records: TransactionalBitmap::from_values(entity_ids),
        }
    }

    /// Facet id
    pub fn facet_id(&self) -> PrimaryKey {
        self.facet_id
    }

    /// Referencing entities
    pub fn records(&self, tx: Option<&Transaction>) -> Bitmap {
        self.records.bitmap(tx)
    }

    /// Referencing entities as a sorted array
    pub fn record_ids(&self, tx: Option<&Transaction>) -> Vec<u32> {
        self.records.to_array(tx)
    }

    /// Check if `entity` references the facet
    pub fn contains(&self, tx: Option<&Transaction>, entity: PrimaryKey) -> bool {
        self.records.contains(tx, entity)
    }

    /// Number of referencing entities
    pub fn size(&self, tx: Option<&Transaction>) -> u64 {
        self.records.len(tx)
    }

    /// Check if no entity references the facet
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.records.is_empty(tx)
    }

    /// Returns `true` if `entity` wasn't referencing the facet yet
    pub fn add_facet(writer: Writer<'_, Self>, entity: PrimaryKey) -> bool {
        TransactionalBitmap::add(project!(writer, records), entity)
    }

    /// Returns `true` if `entity` was referencing the facet
    pub fn remove_facet(writer: Writer<'_, Self>, entity: PrimaryKey) -> bool {
        TransactionalBitmap::remove(project!(writer, records), entity)
    }
}

impl TransactionalLayerProducer for FacetIdIndex {
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
            facet_id: self.facet_id,
            records: maintainer.get_state_copy_with_committed_changes(&self.records),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.records.clear_transactional_memory(transaction);
    }
}
