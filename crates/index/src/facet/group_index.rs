//! Facets of one group

use super::id_index::FacetIdIndex;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, Writer,
};
use tessera_core::{Identity, PrimaryKey, StructureId};

/// Facet id indexes of one group; `group_id == None` holds ungrouped facets
#[derive(Debug, Clone)]
pub struct FacetGroupIndex {
    identity: Identity,
    group_id: Option<PrimaryKey>,
    facet_id_indexes: TransactionalMap<PrimaryKey, Arc<FacetIdIndex>>,
}

impl FacetGroupIndex {
    /// Group without facets
    pub fn new(group_id: Option<PrimaryKey>) -> Self {
        Self::with_facets(group_id, [])
    }

    /// Group preloaded with `facets`
    pub fn with_facets(
        group_id: Option<PrimaryKey>,
        facets: impl IntoIterator<Item = FacetIdIndex>,
    ) -> Self {
        Self {
            identity: Identity::new(),
            group_id,
            facet_id_indexes: facets
                .into_iter()
                .map(|facet| (facet.facet_id(), Arc::new(facet)))
                .collect(),
        }
    }

    /// Group id, `None` for the ungrouped facets
    pub fn group_id(&self) -> Option<PrimaryKey> {
        self.group_id
    }

    /// Index of `facet_id` if any entity references it
    pub fn facet_id_index<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        facet_id: PrimaryKey,
    ) -> Option<&'a FacetIdIndex> {
        self.facet_id_indexes.get(tx, &facet_id).map(Arc::as_ref)
    }

    /// Facet id indexes ordered by facet id
    pub fn facet_id_indexes<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a FacetIdIndex> + 'a {
        self.facet_id_indexes.values(tx).map(Arc::as_ref)
    }

    /// Number of facets in the group
    pub fn size(&self, tx: Option<&Transaction>) -> usize {
        self.facet_id_indexes.len(tx)
    }

    /// Check if the group holds no facet
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.facet_id_indexes.is_empty(tx)
    }

    /// Returns `true` if `entity` wasn't referencing `facet_id` yet
    pub fn add_facet(writer: Writer<'_, Self>, facet_id: PrimaryKey, entity: PrimaryKey) -> bool {
        TransactionalMap::with_child_or_create(
            project!(writer, facet_id_indexes),
            facet_id,
            || FacetIdIndex::new(facet_id),
            |facet| FacetIdIndex::add_facet(facet, entity),
        )
    }

    /// Returns `true` if `entity` was referencing `facet_id`.
    ///
    /// A facet left without entities is removed from the group.
    pub fn remove_facet(
        mut writer: Writer<'_, Self>,
        facet_id: PrimaryKey,
        entity: PrimaryKey,
    ) -> bool {
        let tx = writer.transaction();
        let referenced = writer
            .target()
            .facet_id_index(tx, facet_id)
            .is_some_and(|facet| facet.contains(tx, entity));
        if !referenced {
            return false;
        }

        TransactionalMap::with_child(
            project!(writer.reborrow(), facet_id_indexes),
            &facet_id,
            |facet| FacetIdIndex::remove_facet(facet, entity),
        );

        let tx = writer.transaction();
        let emptied = writer
            .target()
            .facet_id_index(tx, facet_id)
            .is_some_and(|facet| facet.is_empty(tx));
        if emptied {
            TransactionalMap::remove_child(project!(writer, facet_id_indexes), &facet_id);
        }
        true
    }
}

impl TransactionalLayerProducer for FacetGroupIndex {
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
            group_id: self.group_id,
            facet_id_indexes: self.facet_id_indexes.merge_children(maintainer),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.facet_id_indexes.clear_children(transaction);
    }
}
