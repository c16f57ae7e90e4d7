//! Facet Scenario Tests

use crate::common::*;

#[test]
fn group_pruned_after_last_entity() {
    init_tracing();
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(10), 100);
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(10), 101);
    let group_size = |index: &FacetIndex| {
        index
            .facet_entity_type_index(None, "brand")
            .and_then(|types| types.facets_in_group(None, 10))
            .and_then(|group| group.facet_id_index(None, 5))
            .map(|facet| facet.size(None))
    };
    assert_eq!(group_size(&index), Some(2));

    FacetIndex::remove_facet(Writer::direct(&mut index), &brand(5), Some(10), 100).unwrap();
    assert_eq!(group_size(&index), Some(1));

    // keep the entity type alive so the grouped facets can be inspected
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(6), None, 100);
    FacetIndex::remove_facet(Writer::direct(&mut index), &brand(5), Some(10), 101).unwrap();
    let types = index.facet_entity_type_index(None, "brand").unwrap();
    assert!(types.grouped_facets(None).all(|group| group.group_id() != Some(10)));
    assert!(!index.is_facet_in_group(None, "brand", 10, 5));
}

#[test]
fn staged_changes_are_private_until_commit() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(10), 100);

    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&index, &mut tx), &brand(5), Some(10), 101);
    FacetIndex::remove_facet(Writer::staged(&index, &mut tx), &brand(5), Some(10), 100).unwrap();

    let records = |index: &FacetIndex, tx: Option<&Transaction>| {
        index
            .facet_entity_type_index(tx, "brand")
            .and_then(|types| types.facets_in_group(tx, 10))
            .and_then(|group| group.facet_id_index(tx, 5))
            .map(|facet| facet.record_ids(tx))
            .unwrap_or_default()
    };
    assert_eq!(records(&index, None), vec![100]);
    assert_eq!(records(&index, Some(&tx)), vec![101]);

    let committed = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))
        .unwrap();
    assert_eq!(records(&committed, None), vec![101]);
    assert_eq!(records(&index, None), vec![100]);
}

#[test]
fn referencing_entity_ids_per_group() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(1), Some(10), 100);
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(2), Some(10), 101);
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(3), None, 102);

    let formulas = index.facet_referencing_entity_ids(None, "brand", &[3, 2, 1, 9], |group, facets, bitmaps| {
        let union = bitmaps.iter().fold(Vec::new(), |mut all, bitmap| {
            all.extend(bitmap.iter());
            all
        });
        (group, facets.to_vec(), union)
    });
    assert_eq!(
        formulas,
        vec![
            (None, vec![3, 9], vec![102]),
            (Some(10), vec![1, 2], vec![100, 101]),
        ]
    );

    assert!(index
        .facet_referencing_entity_ids(None, "colour", &[1], |group, _, _| group)
        .is_empty());
}
