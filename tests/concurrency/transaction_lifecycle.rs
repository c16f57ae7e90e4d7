//! Transaction Lifecycle Tests
//!
//! Commit consumes every layer; rollback drops them; failed operations stage
//! nothing.

use crate::common::*;
use tessera::{TransactionalLayerProducer, TransactionalMap};

#[test]
fn rollback_leaves_base_untouched() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), None, 100);

    let mut tx = Transaction::new();
    FacetIndex::remove_facet(Writer::staged(&index, &mut tx), &brand(5), None, 100).unwrap();
    assert_eq!(index.size(Some(&tx)), 0);
    assert!(tx.rollback() > 0);

    assert_eq!(index.size(None), 1);
    assert!(index.facet_entity_type_index(None, "brand").is_some());
}

#[test]
fn commit_consumes_every_layer() {
    init_tracing();
    let index = FacetIndex::new();
    let prices = PriceSuperIndex::new(&IndexConfig::default());
    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&index, &mut tx), &brand(5), Some(1), 100);
    FacetIndex::add_facet(Writer::staged(&index, &mut tx), &category(6), None, 100);
    PriceSuperIndex::add_price(Writer::staged(&prices, &mut tx), &(), &eur_price(100, "basic", 1)).unwrap();

    let (facets, prices) = tx
        .commit(|maintainer| {
            (
                maintainer.get_state_copy_with_committed_changes(&index),
                maintainer.get_state_copy_with_committed_changes(&prices),
            )
        })
        .unwrap();
    assert_eq!(facets.size(None), 2);
    assert!(!prices.is_empty(None));
}

#[test]
fn commit_with_unmerged_structure_fails() {
    let facets = FacetIndex::new();
    let prices = PriceSuperIndex::new(&IndexConfig::default());
    let mut tx = Transaction::new();
    FacetIndex::add_facet(Writer::staged(&facets, &mut tx), &brand(5), None, 100);
    PriceSuperIndex::add_price(Writer::staged(&prices, &mut tx), &(), &eur_price(100, "basic", 1)).unwrap();

    let result = tx.commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&facets));
    assert!(matches!(result, Err(IndexError::UnconsumedLayers { .. })));
}

#[test]
fn lenient_commit_only_warns() {
    init_tracing();
    let config = IndexConfig::from_toml_str("fail_on_unconsumed_layers = false").unwrap();
    let map: TransactionalMap<u32, String> = TransactionalMap::new();
    let other: TransactionalMap<u32, String> = TransactionalMap::new();
    let mut tx = Transaction::with_config(&config);
    TransactionalMap::insert(Writer::staged(&map, &mut tx), 1, "one".to_owned());
    TransactionalMap::insert(Writer::staged(&other, &mut tx), 2, "two".to_owned());

    let merged = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&map))
        .unwrap();
    assert_eq!(merged.get(None, &1).map(String::as_str), Some("one"));
    assert_ne!(merged.structure_id(), map.structure_id());
}

#[test]
fn failed_facet_removal_stages_nothing() {
    let mut index = FacetIndex::new();
    FacetIndex::add_facet(Writer::direct(&mut index), &brand(5), Some(1), 100);

    let mut tx = Transaction::new();
    let result = FacetIndex::remove_facet(Writer::staged(&index, &mut tx), &brand(5), Some(2), 100);
    assert!(matches!(result, Err(IndexError::FacetNotIndexed { group_id: Some(2), .. })));
    assert_eq!(tx.layer_count(), 0);
    assert_eq!(tx.rollback(), 0);
}
