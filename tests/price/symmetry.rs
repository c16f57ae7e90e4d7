//! Add / Remove Symmetry Tests

use crate::common::*;
use proptest::prelude::*;

#[test]
fn single_price_round_trip_drops_bucket() {
    init_tracing();
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    let price = eur_price(7, "basic", 10);
    let id = PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &price).unwrap();
    assert!(index.price_index(None, &eur_key("basic")).is_some());

    PriceSuperIndex::remove_price(Writer::direct(&mut index), &(), &price.with_internal_price_id(id)).unwrap();
    assert!(index.price_index(None, &eur_key("basic")).is_none());
    assert!(index.is_empty(None));
}

#[test]
fn staged_round_trip_commits_empty_index() {
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(1, "vip", 1)).unwrap();

    let mut tx = Transaction::new();
    let price = eur_price(7, "basic", 10);
    let id = PriceSuperIndex::add_price(Writer::staged(&index, &mut tx), &(), &price).unwrap();
    assert!(index.price_index(Some(&tx), &eur_key("basic")).is_some());
    PriceSuperIndex::remove_price(Writer::staged(&index, &mut tx), &(), &price.with_internal_price_id(id)).unwrap();
    assert!(index.price_index(Some(&tx), &eur_key("basic")).is_none());

    let committed = tx
        .commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))
        .unwrap();
    let keys: Vec<_> = committed.price_indexes(None).map(|bucket| bucket.key().clone()).collect();
    assert_eq!(keys, vec![eur_key("vip")]);
}

#[test]
fn failed_removal_changes_nothing() {
    let mut index = PriceSuperIndex::new(&IndexConfig::default());
    PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &eur_price(7, "basic", 10)).unwrap();

    let mut tx = Transaction::new();
    let missing = eur_price(7, "basic", 10).with_internal_price_id(99);
    assert!(matches!(
        PriceSuperIndex::remove_price(Writer::staged(&index, &mut tx), &(), &missing),
        Err(IndexError::PriceNotIndexed { internal_price_id: 99, .. })
    ));
    assert_eq!(tx.layer_count(), 0);
}

fn at(seconds: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(seconds, 0).unwrap()
}

#[test]
fn inverted_validity_is_rejected() {
    let index = PriceSuperIndex::new(&IndexConfig::default());
    let mut tx = Transaction::new();
    let inverted = eur_price(7, "basic", 10).with_validity(DateTimeRange::between(at(2_000), at(1_000)));

    let result = PriceSuperIndex::add_price(Writer::staged(&index, &mut tx), &(), &inverted);
    assert!(matches!(
        result,
        Err(IndexError::EmptyValidity { price_id: 10, from, to, .. }) if from > to
    ));
    assert_eq!(tx.layer_count(), 0);
    assert!(index.price_index(Some(&tx), &eur_key("basic")).is_none());
}

#[test]
fn removal_with_other_validity_clears_stored_interval() {
    init_tracing();
    let registry = SuperIndexRegistry::new();
    let mut super_index = PriceSuperIndex::new(&IndexConfig::default());
    let price = eur_price(7, "basic", 10).with_validity(DateTimeRange::between(at(1_000), at(2_000)));
    let id = PriceSuperIndex::add_price(Writer::direct(&mut super_index), &(), &price).unwrap();
    let handle = registry.register(super_index);
    let source = registry.get(handle).unwrap();

    let mut ref_index = PriceRefIndex::new(handle);
    let price = price.with_internal_price_id(id);
    PriceRefIndex::add_price(Writer::direct(&mut ref_index), &source, &price).unwrap();

    let inside = at(1_500).timestamp_micros();
    let key = eur_key("basic");
    assert_eq!(source.indexed_record_ids_valid_at(None, &key, inside).to_array(), vec![id]);
    assert_eq!(ref_index.indexed_record_ids_valid_at(None, &key, inside).to_array(), vec![id]);

    // The caller no longer knows the original window
    let stale = eur_price(7, "basic", 10)
        .with_validity(DateTimeRange::since(at(5_000)))
        .with_internal_price_id(id);
    let mut tx = Transaction::new();
    PriceRefIndex::remove_price(Writer::staged(&ref_index, &mut tx), &source, &stale).unwrap();
    PriceSuperIndex::remove_price(Writer::staged(&*source, &mut tx), &(), &stale).unwrap();
    assert!(ref_index.indexed_record_ids_valid_at(Some(&tx), &key, inside).is_empty());
    assert!(source.indexed_record_ids_valid_at(Some(&tx), &key, inside).is_empty());

    let (committed_super, committed_ref) = tx
        .commit(|maintainer| {
            (
                maintainer.get_state_copy_with_committed_changes(&*source),
                maintainer.get_state_copy_with_committed_changes(&ref_index),
            )
        })
        .unwrap();
    assert!(committed_super.is_empty(None));
    assert!(committed_ref.is_empty(None));
}

proptest! {
    #[test]
    fn prop_removing_every_price_empties_index(
        prices in prop::collection::vec((0u32..10, 0usize..3, any::<bool>()), 1..40)
    ) {
        const LISTS: [&str; 3] = ["basic", "vip", "b2b"];
        let mut index = PriceSuperIndex::new(&IndexConfig::default());
        let mut added = Vec::new();
        for (price_id, (entity, list, bounded)) in prices.into_iter().enumerate() {
            let mut price = eur_price(entity, LISTS[list], price_id as u32);
            if bounded {
                price = price.with_validity(DateTimeRange::between(at(1_000 * entity as i64), at(50_000)));
            }
            let id = PriceSuperIndex::add_price(Writer::direct(&mut index), &(), &price).unwrap();
            added.push(price.with_internal_price_id(id));
        }

        for price in added.iter().rev() {
            PriceSuperIndex::remove_price(Writer::direct(&mut index), &(), price).unwrap();
        }
        prop_assert!(index.is_empty(None));
    }
}
