//! Ref Index Tests
//!
//! Ref buckets mirror a subset of the super index and resolve records
//! through the registry.

use crate::common::*;
use std::sync::Arc;

#[test]
fn ref_exposes_the_super_record_itself() {
    init_tracing();
    let registry = SuperIndexRegistry::new();
    let mut super_index = PriceSuperIndex::new(&IndexConfig::default());
    let id = PriceSuperIndex::add_price(Writer::direct(&mut super_index), &(), &eur_price(7, "basic", 10)).unwrap();
    let handle = registry.register(super_index);

    let mut refs = PriceRefIndex::new(handle);
    let source = registry.get(refs.super_index()).unwrap();
    PriceRefIndex::add_price(
        Writer::direct(&mut refs),
        &source,
        &eur_price(7, "basic", 10).with_internal_price_id(id),
    )
    .unwrap();

    let shared = refs.price_index(None, &eur_key("basic")).unwrap().price_records(None, &source);
    let owned = source.price_index(None, &eur_key("basic")).unwrap().price_records(None, &());
    assert_eq!(shared.len(), 1);
    assert!(Arc::ptr_eq(&shared[0], &owned[0]));
    assert_eq!(shared[0].price_with_tax, 121);
}

#[test]
fn ref_add_requires_price_in_super_index() {
    let registry = SuperIndexRegistry::new();
    let handle = registry.register(PriceSuperIndex::new(&IndexConfig::default()));
    let source = registry.get(handle).unwrap();

    let mut refs = PriceRefIndex::new(handle);
    let price = eur_price(7, "basic", 10).with_internal_price_id(1);
    assert!(matches!(
        PriceRefIndex::add_price(Writer::direct(&mut refs), &source, &price),
        Err(IndexError::MissingPriceIndex(_))
    ));
    assert!(refs.is_empty(None));
}

#[test]
fn registry_replacement_after_commit_repoints_refs() {
    let registry = SuperIndexRegistry::new();
    let handle = registry.register(PriceSuperIndex::new(&IndexConfig::default()));
    let refs = PriceRefIndex::new(handle);

    // the ref add sees the super price staged in the same transaction
    let mut tx = Transaction::new();
    let base = registry.get(handle).unwrap();
    let price = eur_price(7, "basic", 10);
    let id = PriceSuperIndex::add_price(Writer::staged(&*base, &mut tx), &(), &price).unwrap();
    PriceRefIndex::add_price(Writer::staged(&refs, &mut tx), &base, &price.with_internal_price_id(id)).unwrap();
    assert!(refs.is_empty(None));

    let (merged_super, merged_refs) = tx
        .commit(|maintainer| {
            (
                maintainer.get_state_copy_with_committed_changes(&*base),
                maintainer.get_state_copy_with_committed_changes(&refs),
            )
        })
        .unwrap();
    let previous = registry.replace(handle, merged_super).unwrap();
    assert!(Arc::ptr_eq(&previous, &base));
    assert_eq!(merged_refs.super_index(), handle);

    let source = registry.get(merged_refs.super_index()).unwrap();
    let records = merged_refs
        .price_index(None, &eur_key("basic"))
        .unwrap()
        .price_records(None, &source);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity_primary_key, 7);

    // the replaced index no longer resolves the ref's records
    assert!(merged_refs
        .price_index(None, &eur_key("basic"))
        .unwrap()
        .price_records(None, &previous)
        .is_empty());
}

#[test]
fn ref_removal_keeps_entity_while_another_mirrored_price_remains() {
    let mut super_index = PriceSuperIndex::new(&IndexConfig::default());
    let ids: Vec<u32> = (10..13)
        .map(|price_id| {
            PriceSuperIndex::add_price(Writer::direct(&mut super_index), &(), &eur_price(7, "basic", price_id)).unwrap()
        })
        .collect();
    let registry = SuperIndexRegistry::new();
    let handle = registry.register(super_index);
    let source = registry.get(handle).unwrap();

    let mut refs = PriceRefIndex::new(handle);
    for (&id, price_id) in ids.iter().zip(10..12) {
        PriceRefIndex::add_price(
            Writer::direct(&mut refs),
            &source,
            &eur_price(7, "basic", price_id).with_internal_price_id(id),
        )
        .unwrap();
    }

    PriceRefIndex::remove_price(Writer::direct(&mut refs), &source, &eur_price(7, "basic", 10).with_internal_price_id(ids[0])).unwrap();
    assert_eq!(refs.indexed_price_entity_ids(None, &eur_key("basic")).to_array(), vec![7]);

    PriceRefIndex::remove_price(Writer::direct(&mut refs), &source, &eur_price(7, "basic", 11).with_internal_price_id(ids[1])).unwrap();
    assert!(refs.is_empty(None));
    assert_eq!(source.indexed_price_entity_ids(None, &eur_key("basic")).to_array(), vec![7]);
}
