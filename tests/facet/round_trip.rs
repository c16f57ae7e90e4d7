//! Storage Part Round Trip Tests

use crate::common::*;
use proptest::prelude::*;
use tessera::{FacetEntityTypeIndex, StoragePart};

fn snapshot_of(index: &FacetEntityTypeIndex) -> Vec<(Option<PrimaryKey>, PrimaryKey, Vec<u32>, Vec<u32>)> {
    index
        .facet_group_indexes(None)
        .flat_map(|group| {
            group.facet_id_indexes(None).map(move |facet| {
                (
                    group.group_id(),
                    facet.facet_id(),
                    facet.record_ids(None),
                    index
                        .facet_to_groups(None, facet.facet_id())
                        .map(<[u32]>::to_vec)
                        .unwrap_or_default(),
                )
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_rebuilt_index_is_observably_equal(
        refs in prop::collection::vec((0u32..6, proptest::option::of(0u32..4), 0u32..20), 1..50)
    ) {
        let mut index = FacetIndex::new();
        for (facet_id, group_id, entity) in refs {
            FacetIndex::add_facet(Writer::direct(&mut index), &brand(facet_id), group_id, entity);
        }
        let original = index.facet_entity_type_index(None, "brand").unwrap();
        let part = original.create_storage_part(None, 1);

        let rebuilt = FacetEntityTypeIndex::from_storage_part(&part).unwrap();
        prop_assert_eq!(snapshot_of(&rebuilt), snapshot_of(original));
        prop_assert_eq!(rebuilt.create_storage_part(None, 1), part);
    }
}

#[test]
fn flushed_parts_rebuild_whole_index() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(10), 100);
    FacetIndex::add_facet(Writer::direct(&mut index), &category(1), None, 100);
    let parts = index.modified_storage_parts(None, 7);
    assert_eq!(parts.len(), 2);

    let json: Vec<String> = parts
        .iter()
        .cloned()
        .map(|part| serde_json::to_string(&StoragePart::from(part)).unwrap())
        .collect();
    let loaded: Vec<_> = json
        .iter()
        .map(|text| match serde_json::from_str::<StoragePart>(text).unwrap() {
            StoragePart::Facet(part) => part,
            other => panic!("unexpected part {other:?}"),
        })
        .collect();

    let restored = FacetIndex::from_storage_parts(&loaded).unwrap();
    assert!(restored.is_facet_in_group(None, "brand", 10, 5));
    assert_eq!(restored.referenced_entities(None).collect::<Vec<_>>(), vec!["brand", "category"]);
    assert_eq!(restored.dirty_entity_types(None).count(), 0);
}

#[test]
fn dropped_type_is_flushed_as_empty_part() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), None, 100);
    FacetIndex::reset_dirty(Writer::direct(&mut index));
    FacetIndex::remove_facet(Writer::direct(&mut index), &brand(5), None, 100).unwrap();

    let parts = index.modified_storage_parts(None, 7);
    assert_eq!(parts.len(), 1);
    assert!(parts[0].groups.is_empty());
    assert_eq!(FacetIndex::from_storage_parts(&parts).unwrap().size(None), 0);
}
