//! Snapshot Isolation Tests
//!
//! Tests the snapshot isolation guarantees:
//! - Readers of a published base never see later commits
//! - Read-your-writes within a transaction
//! - Untouched children stay shared with the previous base

use crate::common::*;
use std::sync::Arc;
use std::thread;

#[test]
fn reader_keeps_its_base_after_writer_commits() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), None, 100);
    let published = Arc::new(index);

    // reader pinned to the base published at T1
    let reader = Arc::clone(&published);

    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&*published, &mut tx), &brand(5), None, 101);
    let next = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&*published))
        .unwrap();

    let records = |index: &FacetIndex| {
        index
            .facet_entity_type_index(None, "brand")
            .and_then(|types| types.not_grouped_facets(None))
            .and_then(|group| group.facet_id_index(None, 5))
            .map(|facet| facet.record_ids(None))
            .unwrap_or_default()
    };
    assert_eq!(records(&reader), vec![100]);
    assert_eq!(records(&next), vec![100, 101]);
}

#[test]
fn concurrent_readers_see_stable_base() {
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    for price_id in 0..50 {
        PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(price_id, "basic", price_id)).unwrap();
    }
    let base = Arc::new(index);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let base = Arc::clone(&base);
            thread::spawn(move || {
                (0..100)
                    .map(|_| base.indexed_price_entity_ids(None, &eur_key("basic")).len())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut tx = Transaction::new();
    for price_id in 50..80 {
        PriceSuperIndex::add_price(Writer::staged(&*base, &mut tx), &(), &eur_price(price_id, "basic", price_id)).unwrap();
    }
    let committed = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&*base))
        .unwrap();

    for reader in readers {
        assert!(reader.join().unwrap().iter().all(|&len| len == 50));
    }
    assert_eq!(committed.indexed_price_entity_ids(None, &eur_key("basic")).len(), 80);
}

#[test]
fn read_your_writes_across_levels() {
    let index = FacetIndex::new();
    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&index, &mut tx), &brand(5), Some(10), 100);

    assert!(index.is_facet_in_group(Some(&tx), "brand", 10, 5));
    assert!(!index.is_facet_in_group(None, "brand", 10, 5));
    assert_eq!(index.dirty_entity_types(Some(&tx)).collect::<Vec<_>>(), vec!["brand"]);
    tx.rollback();
}

#[test]
fn untouched_children_stay_shared() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(1), None, 100);
    FacetIndex::add_facet(Writer::direct(&mut index), &category(2), None, 100);

    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&index, &mut tx), &brand(1), None, 101);
    let committed = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))
        .unwrap();

    let before = index.facet_entity_type_index(None, "category").unwrap();
    let after = committed.facet_entity_type_index(None, "category").unwrap();
    assert!(std::ptr::eq(before, after));
    assert!(!std::ptr::eq(
        index.facet_entity_type_index(None, "brand").unwrap(),
        committed.facet_entity_type_index(None, "brand").unwrap(),
    ));
}
