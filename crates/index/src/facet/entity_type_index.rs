//! Facet groups of one referenced entity type
//!
//! Besides the groups, the index maintains a reverse lookup
//! `facet id -> sorted group ids` that holds exactly the groups currently
//! containing a facet id index for that facet. Empty arrays are never kept.

use super::group_index::FacetGroupIndex;
use super::id_index::FacetIdIndex;
use crate::storage_part::{FacetGroupSnapshot, FacetIdSnapshot, FacetIndexStoragePart};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, TransactionalReference, Writer,
};
use tessera_core::array::{contains_sorted, insert_sorted};
use tessera_core::{Bitmap, Identity, IndexError, IndexResult, PrimaryKey, StructureId};

/// Grouped and ungrouped facets of one entity type
#[derive(Debug, Clone)]
pub struct FacetEntityTypeIndex {
    identity: Identity,
    entity_type: String,
    not_grouped_facets: TransactionalReference<Arc<FacetGroupIndex>>,
    grouped_facets: TransactionalMap<PrimaryKey, Arc<FacetGroupIndex>>,
    facet_to_group_index: TransactionalMap<PrimaryKey, Vec<PrimaryKey>>,
}

impl FacetEntityTypeIndex {
    /// Index without any facet
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            identity: Identity::new(),
            entity_type: entity_type.into(),
            not_grouped_facets: TransactionalReference::default(),
            grouped_facets: TransactionalMap::default(),
            facet_to_group_index: TransactionalMap::default(),
        }
    }

    /// Rebuild from persisted groups; the reverse lookup is derived.
    ///
    /// # Errors
    ///
    /// `DuplicateUngroupedIndex` when more than one group has no group id.
    pub fn from_groups(
        entity_type: impl Into<String>,
        groups: impl IntoIterator<Item = FacetGroupIndex>,
    ) -> IndexResult<Self> {
        let entity_type = entity_type.into();
        let mut not_grouped = None;
        let mut grouped = BTreeMap::new();
        let mut facet_to_groups: BTreeMap<PrimaryKey, Vec<PrimaryKey>> = BTreeMap::new();

        for group in groups {
            match group.group_id() {
                None => {
                    if not_grouped.is_some() {
                        return Err(IndexError::DuplicateUngroupedIndex(entity_type));
                    }
                    not_grouped = Some(Arc::new(group));
                }
                Some(group_id) => {
                    for facet in group.facet_id_indexes(None) {
                        insert_sorted(
                            facet_to_groups.entry(facet.facet_id()).or_default(),
                            group_id,
                        );
                    }
                    grouped.insert(group_id, Arc::new(group));
                }
            }
        }

        Ok(Self {
            identity: Identity::new(),
            entity_type,
            not_grouped_facets: TransactionalReference::new(not_grouped),
            grouped_facets: grouped.into_iter().collect(),
            facet_to_group_index: facet_to_groups.into_iter().collect(),
        })
    }

    /// Rebuild from a persisted storage part
    pub fn from_storage_part(part: &FacetIndexStoragePart) -> IndexResult<Self> {
        let groups = part.groups.iter().map(|group| {
            FacetGroupIndex::with_facets(
                group.group_id,
                group.facets.iter().map(|facet| {
                    FacetIdIndex::with_records(facet.facet_id, facet.entity_ids.iter().copied())
                }),
            )
        });
        Self::from_groups(part.entity_type.clone(), groups)
    }

    /// Snapshot form persisted by the storage layer
    pub fn create_storage_part(
        &self,
        tx: Option<&Transaction>,
        owner_primary_key: PrimaryKey,
    ) -> FacetIndexStoragePart {
        let groups = self
            .facet_group_indexes(tx)
            .map(|group| FacetGroupSnapshot {
                group_id: group.group_id(),
                facets: group
                    .facet_id_indexes(tx)
                    .map(|facet| FacetIdSnapshot {
                        facet_id: facet.facet_id(),
                        entity_ids: facet.record_ids(tx),
                    })
                    .collect(),
            })
            .collect();
        FacetIndexStoragePart {
            owner_primary_key,
            entity_type: self.entity_type.clone(),
            groups,
        }
    }

    /// Referenced entity type
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Group of facets without group assignment
    pub fn not_grouped_facets<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> Option<&'a FacetGroupIndex> {
        self.not_grouped_facets.get(tx).map(Arc::as_ref)
    }

    /// Groups ordered by group id
    pub fn grouped_facets<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a FacetGroupIndex> + 'a {
        self.grouped_facets.values(tx).map(Arc::as_ref)
    }

    /// Group `group_id`, if it holds any facet
    pub fn facets_in_group<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        group_id: PrimaryKey,
    ) -> Option<&'a FacetGroupIndex> {
        self.grouped_facets.get(tx, &group_id).map(Arc::as_ref)
    }

    /// Group `group_id`, or the ungrouped facets for `None`
    pub fn facet_group<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        group_id: Option<PrimaryKey>,
    ) -> Option<&'a FacetGroupIndex> {
        match group_id {
            None => self.not_grouped_facets(tx),
            Some(group_id) => self.facets_in_group(tx, group_id),
        }
    }

    /// Ungrouped facets first, then the groups by id
    pub fn facet_group_indexes<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
    ) -> impl Iterator<Item = &'a FacetGroupIndex> + 'a {
        self.not_grouped_facets(tx)
            .into_iter()
            .chain(self.grouped_facets(tx))
    }

    /// Number of facet groups, the ungrouped one included
    pub fn size(&self, tx: Option<&Transaction>) -> usize {
        self.grouped_facets.len(tx) + usize::from(self.not_grouped_facets.get(tx).is_some())
    }

    /// Check if the index holds no facet group
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.size(tx) == 0
    }

    /// Sorted ids of the groups containing `facet_id`
    pub fn facet_to_groups<'a>(
        &'a self,
        tx: Option<&'a Transaction>,
        facet_id: PrimaryKey,
    ) -> Option<&'a [PrimaryKey]> {
        self.facet_to_group_index.get(tx, &facet_id).map(Vec::as_slice)
    }

    /// Check if group `group_id` contains `facet_id`
    pub fn is_facet_in_group(
        &self,
        tx: Option<&Transaction>,
        group_id: PrimaryKey,
        facet_id: PrimaryKey,
    ) -> bool {
        self.facet_to_groups(tx, facet_id)
            .is_some_and(|groups| contains_sorted(groups, &group_id))
    }

    /// Hand the bitmaps of `facet_ids` to `factory`, one call per group.
    ///
    /// Facets are resolved through the reverse lookup; facets it doesn't know
    /// are looked up among the ungrouped facets. A facet absent from its group
    /// contributes an empty bitmap. Groups are visited ungrouped first, then
    /// by group id.
    pub fn facet_referencing_entity_ids<F>(
        &self,
        tx: Option<&Transaction>,
        facet_ids: &[PrimaryKey],
        mut factory: impl FnMut(Option<PrimaryKey>, &[PrimaryKey], &[Bitmap]) -> F,
    ) -> Vec<F> {
        let mut facets_by_group: BTreeMap<Option<PrimaryKey>, Vec<PrimaryKey>> = BTreeMap::new();
        for &facet_id in facet_ids {
            match self.facet_to_groups(tx, facet_id) {
                Some(groups) => {
                    for &group_id in groups {
                        insert_sorted(facets_by_group.entry(Some(group_id)).or_default(), facet_id);
                    }
                }
                None => {
                    insert_sorted(facets_by_group.entry(None).or_default(), facet_id);
                }
            }
        }

        facets_by_group
            .into_iter()
            .map(|(group_id, facets)| {
                let group = self.facet_group(tx, group_id);
                let bitmaps: Vec<Bitmap> = facets
                    .iter()
                    .map(|&facet_id| {
                        group
                            .and_then(|group| group.facet_id_index(tx, facet_id))
                            .map(|facet| facet.records(tx))
                            .unwrap_or_default()
                    })
                    .collect();
                factory(group_id, &facets, &bitmaps)
            })
            .collect()
    }

    /// Returns `true` if `entity` wasn't referencing the facet in that group yet
    pub fn add_facet(
        mut writer: Writer<'_, Self>,
        facet_id: PrimaryKey,
        group_id: Option<PrimaryKey>,
        entity: PrimaryKey,
    ) -> bool {
        let Some(group_id) = group_id else {
            return TransactionalReference::with_child_or_create(
                project!(writer, not_grouped_facets),
                || FacetGroupIndex::new(None),
                |group| FacetGroupIndex::add_facet(group, facet_id, entity),
            );
        };

        let added = TransactionalMap::with_child_or_create(
            project!(writer.reborrow(), grouped_facets),
            group_id,
            || FacetGroupIndex::new(Some(group_id)),
            |group| FacetGroupIndex::add_facet(group, facet_id, entity),
        );

        let tx = writer.transaction();
        if !writer.target().is_facet_in_group(tx, group_id, facet_id) {
            TransactionalMap::compute(
                project!(writer, facet_to_group_index),
                facet_id,
                |groups| {
                    let mut groups = groups.cloned().unwrap_or_default();
                    insert_sorted(&mut groups, group_id);
                    Some(groups)
                },
            );
        }
        added
    }

    /// Returns `true` if `entity` was referencing the facet in that group.
    ///
    /// A facet left without entities leaves its group, a group left without
    /// facets leaves the index, and the reverse lookup of a grouped facet is
    /// recomputed.
    ///
    /// # Errors
    ///
    /// `FacetNotIndexed` when the group doesn't exist.
    pub fn remove_facet(
        mut writer: Writer<'_, Self>,
        facet_id: PrimaryKey,
        group_id: Option<PrimaryKey>,
        entity: PrimaryKey,
    ) -> IndexResult<bool> {
        let tx = writer.transaction();
        let Some(group) = writer.target().facet_group(tx, group_id) else {
            return Err(IndexError::FacetNotIndexed {
                entity_type: writer.target().entity_type.clone(),
                group_id,
            });
        };
        let referenced = group
            .facet_id_index(tx, facet_id)
            .is_some_and(|facet| facet.contains(tx, entity));
        if !referenced {
            return Ok(false);
        }

        match group_id {
            None => {
                TransactionalReference::with_child(
                    project!(writer.reborrow(), not_grouped_facets),
                    |group| FacetGroupIndex::remove_facet(group, facet_id, entity),
                );
                let tx = writer.transaction();
                if writer.target().not_grouped_facets(tx).is_some_and(|g| g.is_empty(tx)) {
                    TransactionalReference::clear_child(project!(writer, not_grouped_facets));
                }
            }
            Some(group_id) => {
                TransactionalMap::with_child(
                    project!(writer.reborrow(), grouped_facets),
                    &group_id,
                    |group| FacetGroupIndex::remove_facet(group, facet_id, entity),
                );
                let tx = writer.transaction();
                if writer.target().facets_in_group(tx, group_id).is_some_and(|g| g.is_empty(tx)) {
                    TransactionalMap::remove_child(
                        project!(writer.reborrow(), grouped_facets),
                        &group_id,
                    );
                }
                Self::recompute_facet_to_groups(writer, facet_id);
            }
        }
        Ok(true)
    }

    fn recompute_facet_to_groups(writer: Writer<'_, Self>, facet_id: PrimaryKey) {
        let tx = writer.transaction();
        let index = writer.target();
        let Some(groups) = index.facet_to_groups(tx, facet_id) else {
            return;
        };
        let retained: Vec<PrimaryKey> = groups
            .iter()
            .copied()
            .filter(|&group_id| {
                index
                    .facets_in_group(tx, group_id)
                    .is_some_and(|group| group.facet_id_index(tx, facet_id).is_some())
            })
            .collect();
        if retained.len() == groups.len() {
            return;
        }

        let reverse = project!(writer, facet_to_group_index);
        if retained.is_empty() {
            TransactionalMap::remove(reverse, &facet_id);
        } else {
            TransactionalMap::insert(reverse, facet_id, retained);
        }
    }
}

impl TransactionalLayerProducer for FacetEntityTypeIndex {
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
            entity_type: self.entity_type.clone(),
            not_grouped_facets: self.not_grouped_facets.merge_child(maintainer),
            grouped_facets: self.grouped_facets.merge_children(maintainer),
            facet_to_group_index: maintainer
                .get_state_copy_with_committed_changes(&self.facet_to_group_index),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.not_grouped_facets.clear_children(transaction);
        self.grouped_facets.clear_children(transaction);
        self.facet_to_group_index
            .clear_transactional_memory(transaction);
    }
}
