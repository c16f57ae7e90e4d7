//! Root of the facet index family
//!
//! Routes facet writes to the entity type index of the referenced entity
//! type, creates entity type indexes on demand and drops them once their
//! last group is gone. Entity types whose index changed are tracked in the
//! dirty set until the persistence layer calls `reset_dirty`.

use super::entity_type_index::FacetEntityTypeIndex;
use crate::storage_part::FacetIndexStoragePart;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, TransactionalSet, Writer,
};
use tessera_core::{Bitmap, Identity, IndexError, IndexResult, PrimaryKey, ReferenceKey, StructureId};
use tracing::debug;

/// Facet index of one entity collection
#[derive(Debug, Clone, Default)]
pub struct FacetIndex {
    identity: Identity,
    faceting_entities: TransactionalMap<String, Arc<FacetEntityTypeIndex>>,
    dirty_indexes: TransactionalSet<String>,
}

impl FacetIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted storage parts, one per entity type.
    ///
    /// Parts without groups describe entity types whose index was dropped
    /// and are skipped.
    pub fn from_storage_parts<'p>(
        parts: impl IntoIterator<Item = &'p FacetIndexStoragePart>,
    ) -> IndexResult<Self> {
        let mut faceting_entities = Vec::new();
        for part in parts {
            if part.groups.is_empty() {
                continue;
            }
            let index = FacetEntityTypeIndex::from_storage_part(part)?;
            faceting_entities.push((part.entity_type.clone(), Arc::new(index)));
        }
        Ok(Self {
            identity: Identity::new(),
            faceting_entities: faceting_entities.into_iter().collect(),
            dirty_indexes: TransactionalSet::new(),
        })
    }

    /// Entity type indexes ordered by entity type
    pub fn faceting_entities<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a FacetEntityTypeIndex> + 'a {
        self.faceting_entities.values(tx).map(Arc::as_ref)
    }

    /// Entity types that have a facet index
    pub fn referenced_entities<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.faceting_entities.keys(tx).map(String::as_str)
    }

    /// Number of entity types that have a facet index
    pub fn size(&self, tx: Option<&Transaction>) -> usize {
        self.faceting_entities.len(tx)
    }

    /// Index of `entity_type`, if any facet of that type is referenced
    pub fn facet_entity_type_index<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        entity_type: &str,
    ) -> Option<&'a FacetEntityTypeIndex> {
        self.faceting_entities
            .get(tx, entity_type)
            .map(Arc::as_ref)
    }

    /// See `FacetEntityTypeIndex::facet_referencing_entity_ids`; an unknown
    /// entity type yields no result.
    pub fn facet_referencing_entity_ids<F>(
        &self,
        tx: Option<&Transaction>,
        entity_type: &str,
        facet_ids: &[PrimaryKey],
        factory: impl FnMut(Option<PrimaryKey>, &[PrimaryKey], &[Bitmap]) -> F,
    ) -> Vec<F> {
        match self.facet_entity_type_index(tx, entity_type) {
            Some(index) => index.facet_referencing_entity_ids(tx, facet_ids, factory),
            None => Vec::new(),
        }
    }

    /// Check if group `group_id` of `entity_type` contains `facet_id`
    pub fn is_facet_in_group(
        &self,
        tx: Option<&Transaction>,
        entity_type: &str,
        group_id: PrimaryKey,
        facet_id: PrimaryKey,
    ) -> bool {
        self.facet_entity_type_index(tx, entity_type)
            .is_some_and(|index| index.is_facet_in_group(tx, group_id, facet_id))
    }

    /// Entity types changed since the last `reset_dirty`
    pub fn dirty_entity_types<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.dirty_indexes.iter(tx).map(String::as_str)
    }

    /// Returns `true` if `entity` wasn't referencing the facet yet
    pub fn add_facet(
        mut writer: Writer<'_, Self>,
        reference_key: &ReferenceKey,
        group_id: Option<PrimaryKey>,
        entity: PrimaryKey,
    ) -> bool {
        let entity_type = &reference_key.entity_type;
        let added = TransactionalMap::with_child_or_create(
            project!(writer.reborrow(), faceting_entities),
            entity_type.clone(),
            || {
                debug!(target: "tessera::facet", %entity_type, "Facet entity type index created");
                FacetEntityTypeIndex::new(entity_type.clone())
            },
            |index| FacetEntityTypeIndex::add_facet(index, reference_key.primary_key, group_id, entity),
        );
        if added {
            TransactionalSet::insert(project!(writer, dirty_indexes), entity_type.clone());
        }
        added
    }

    /// Returns `true` if `entity` was referencing the facet.
    ///
    /// An entity type index left without groups is dropped.
    ///
    /// # Errors
    ///
    /// - `UnknownReferenceType` when no index exists for the entity type
    /// - `FacetNotIndexed` when the group doesn't exist
    pub fn remove_facet(
        mut writer: Writer<'_, Self>,
        reference_key: &ReferenceKey,
        group_id: Option<PrimaryKey>,
        entity: PrimaryKey,
    ) -> IndexResult<bool> {
        let entity_type = &reference_key.entity_type;
        let tx = writer.transaction();
        let Some(index) = writer.target().facet_entity_type_index(tx, entity_type) else {
            return Err(IndexError::UnknownReferenceType(entity_type.clone()));
        };
        if index.facet_group(tx, group_id).is_none() {
            return Err(IndexError::FacetNotIndexed {
                entity_type: entity_type.clone(),
                group_id,
            });
        }
        let referenced = index
            .facet_group(tx, group_id)
            .and_then(|group| group.facet_id_index(tx, reference_key.primary_key))
            .is_some_and(|facet| facet.contains(tx, entity));
        if !referenced {
            return Ok(false);
        }

        TransactionalMap::with_child(
            project!(writer.reborrow(), faceting_entities),
            entity_type,
            |index| FacetEntityTypeIndex::remove_facet(index, reference_key.primary_key, group_id, entity),
        )
        .transpose()?;

        let tx = writer.transaction();
        let emptied = writer
            .target()
            .facet_entity_type_index(tx, entity_type)
            .is_some_and(|index| index.is_empty(tx));
        if emptied {
            TransactionalMap::remove_child(
                project!(writer.reborrow(), faceting_entities),
                entity_type,
            );
            debug!(target: "tessera::facet", %entity_type, "Facet entity type index dropped");
        }
        TransactionalSet::insert(project!(writer, dirty_indexes), entity_type.clone());
        Ok(true)
    }

    /// Storage parts of every dirty entity type.
    ///
    /// A dropped entity type yields a part without groups so the persisted
    /// copy gets removed.
    pub fn modified_storage_parts(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> Vec<FacetIndexStoragePart> {
        self.dirty_entity_types(tx)
            .map(|entity_type| match self.facet_entity_type_index(tx, entity_type) {
                Some(index) => index.create_storage_part(tx, owner_primary_key),
                None => FacetIndexStoragePart {
                    owner_primary_key,
                    entity_type: entity_type.to_owned(),
                    groups: Vec::new(),
                },
            })
            .collect()
    }

    /// Forget the dirty entity types after a successful flush
    pub fn reset_dirty(mut writer: Writer<'_, Self>) {
        let dirty: Vec<String> = writer
            .target()
            .dirty_indexes
            .iter(writer.transaction())
            .cloned()
            .collect();
        for entity_type in &dirty {
            TransactionalSet::remove(project!(writer.reborrow(), dirty_indexes), entity_type);
        }
    }
}

impl TransactionalLayerProducer for FacetIndex {
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
            target: "tessera::facet",
            txn_id = maintainer.transaction_id(),
            structure = %self.identity.id(),
            "Merging facet index"
        );
        Self {
            identity: Identity::new(),
            faceting_entities: self.faceting_entities.merge_children(maintainer),
            dirty_indexes: maintainer.get_state_copy_with_committed_changes(&self.dirty_indexes),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.faceting_entities.clear_children(transaction);
        self.dirty_indexes.clear_transactional_memory(transaction);
    }
}
