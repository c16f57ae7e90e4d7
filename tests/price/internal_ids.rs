//! Internal Price Id Tests

use crate::common::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use tessera::InternalPriceIdSequence;

proptest! {
    #[test]
    fn prop_sequence_strictly_increasing(first in 1u32..1_000_000, n in 1usize..200) {
        let sequence = InternalPriceIdSequence::starting_at(first);
        let ids: Vec<u32> = (0..n).map(|_| sequence.next_id().unwrap()).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(ids[0], first);
    }
}

#[test]
fn concurrent_draws_are_distinct() {
    let sequence = Arc::new(InternalPriceIdSequence::starting_at(1));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sequence = Arc::clone(&sequence);
            thread::spawn(move || (0..500).map(|_| sequence.next_id().unwrap()).collect::<Vec<_>>())
        })
        .collect();

    let mut ids: Vec<u32> = handles.into_iter().flat_map(|handle| handle.join().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8 * 500);
}

#[test]
fn merged_copies_share_the_sequence() {
    let index = PriceSuperIndex::new(&IndexConfig::default());
    let mut tx = Transaction::new();
    let first = PriceSuperIndex::add_price(Writer::staged(&index, &mut tx), &(), &eur_price(7, "basic", 1)).unwrap();
    let mut committed = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))
        .unwrap();

    let second = PriceSuperIndex::add_price(Writer::direct(&mut committed), &(), &eur_price(8, "basic", 2)).unwrap();
    assert!(second > first);
    assert_eq!(index.internal_price_id_sequence().peek(), Some(second + 1));
}

#[test]
fn configured_first_id() {
    let config = IndexConfig::from_toml_str("first_internal_price_id = 1000").unwrap();
    let mut index = PriceSuperIndex::new(&config);
    let id = PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(7, "basic", 1)).unwrap();
    assert_eq!(id, 1000);
}

#[test]
fn supplied_id_is_kept() {
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    let price = eur_price(7, "basic", 1).with_internal_price_id(77);
    assert_eq!(PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &price).unwrap(), 77);
}

#[test]
fn exhausted_sequence_fails_instead_of_wrapping() {
    let config = IndexConfig::from_toml_str(&format!("first_internal_price_id = {}", u32::MAX - 1)).unwrap();
    let mut index = PriceSuperIndex::new(&config);
    let ids: Vec<u32> = (1..=2)
        .map(|price_id| {
            PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(7, "basic", price_id)).unwrap()
        })
        .collect();
    assert_eq!(ids, vec![u32::MAX - 1, u32::MAX]);

    let result = PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(8, "basic", 3));
    assert!(matches!(result, Err(IndexError::InternalPriceIdsExhausted)));
    assert_eq!(index.indexed_price_entity_ids(None, &eur_key("basic")).to_array(), vec![7]);

    // An explicit id still indexes
    let price = eur_price(8, "basic", 3).with_internal_price_id(5);
    assert_eq!(PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &price).unwrap(), 5);
}

#[test]
fn reload_at_upper_bound() {
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    let below = eur_price(7, "basic", 1).with_internal_price_id(u32::MAX - 1);
    PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &below).unwrap();
    let parts = index.create_storage_parts(None, 1);

    let mut restored = PriceSuperIndex::from_storage_parts(&IndexConfig::default(), &parts).unwrap();
    assert_eq!(restored.internal_price_id_sequence().peek(), Some(u32::MAX));
    let last = PriceSuperIndex::add_price(Writer::direct(&mut restored), &(), &eur_price(8, "basic", 2)).unwrap();
    assert_eq!(last, u32::MAX);

    let parts = restored.create_storage_parts(None, 1);
    assert!(matches!(
        PriceSuperIndex::from_storage_parts(&IndexConfig::default(), &parts),
        Err(IndexError::InternalPriceIdsExhausted)
    ));
}
