//! Reverse Index Tests
//!
//! `is_facet_in_group` must agree with the forward structure in every
//! reachable state, committed or staged.

use crate::common::*;
use proptest::prelude::*;

const ENTITY_TYPES: [&str; 2] = ["brand", "category"];

fn assert_consistent(index: &FacetIndex, tx: Option<&Transaction>) {
    for entity_type in ENTITY_TYPES {
        for group_id in 0..3 {
            for facet_id in 0..4 {
                let forward = index
                    .facet_entity_type_index(tx, entity_type)
                    .and_then(|types| types.facets_in_group(tx, group_id))
                    .and_then(|group| group.facet_id_index(tx, facet_id))
                    .is_some_and(|facet| !facet.is_empty(tx));
                assert_eq!(
                    index.is_facet_in_group(tx, entity_type, group_id, facet_id),
                    forward,
                    "{entity_type} group {group_id} facet {facet_id}"
                );
            }
        }
    }
}

fn op() -> impl Strategy<Value = (bool, usize, PrimaryKey, Option<PrimaryKey>, PrimaryKey)> {
    (any::<bool>(), 0usize..2, 0u32..4, proptest::option::of(0u32..3), 0u32..5)
}

fn apply(
    mut writer: Writer<'_, FacetIndex>,
    (add, type_slot, facet_id, group_id, entity): (bool, usize, PrimaryKey, Option<PrimaryKey>, PrimaryKey),
) {
    let key = ReferenceKey::new(ENTITY_TYPES[type_slot], facet_id);
    if add {
        FacetIndex::add_facet(writer.reborrow(), &key, group_id, entity);
    } else {
        let _ = FacetIndex::remove_facet(writer, &key, group_id, entity);
    }
}

proptest! {
    #[test]
    fn prop_reverse_index_matches_groups(
        direct in prop::collection::vec(op(), 0..60),
        staged in prop::collection::vec(op(), 0..60),
    ) {
        let mut index = FacetIndex::new();
        for op in direct {
            apply(Writer::direct(&mut index), op);
            assert_consistent(&index, None);
        }

        let mut tx = Transaction::new();
        for op in staged {
            apply(Writer::staged(&index, &mut tx), op);
            assert_consistent(&index, Some(&tx));
        }
        assert_consistent(&index, None);

        let committed = tx
            .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))
            .unwrap();
        assert_consistent(&committed, None);
    }
}


#[test]
fn facet_in_several_groups() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(2), 1);
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(1), 1);
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), None, 1);

    let types = index.facet_entity_type_index(None, "brand").unwrap();
    assert_eq!(types.facet_to_groups(None, 5), Some(&[1, 2][..]));

    FacetIndex::remove_facet(Writer::direct(&mut index), &brand(5), Some(1), 1).unwrap();
    let types = index.facet_entity_type_index(None, "brand").unwrap();
    assert_eq!(types.facet_to_groups(None, 5), Some(&[2][..]));
    assert!(!index.is_facet_in_group(None, "brand", 1, 5));
}
