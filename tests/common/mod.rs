//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Once;
pub use tessera::{
    Currency, DateTimeRange, FacetIndex, IndexConfig, IndexError, PriceIndexKey,
    PriceInnerRecordHandling, PriceKey, PriceListAndCurrencyIndex, PriceMutation, PriceRefIndex,
    PriceSuperIndex, PrimaryKey, ReferenceKey, SuperIndexRegistry, Transaction, Writer,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route index logs to the test harness output
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Facets
// ============================================================================

/// Reference to brand `facet_id`
pub fn brand(facet_id: PrimaryKey) -> ReferenceKey {
    ReferenceKey::new("brand", facet_id)
}

/// Reference to category `facet_id`
pub fn category(facet_id: PrimaryKey) -> ReferenceKey {
    ReferenceKey::new("category", facet_id)
}

// ============================================================================
// Prices
// ============================================================================

/// Bucket key of `price_list` in EUR without inner record handling
pub fn eur_key(price_list: &str) -> PriceIndexKey {
    PriceIndexKey::new(price_list, Currency::new("EUR"), PriceInnerRecordHandling::None)
}

/// Price `price_id` of `entity` in `price_list`, EUR, 100 / 121
pub fn eur_price(entity: PrimaryKey, price_list: &str, price_id: u32) -> PriceMutation {
    PriceMutation::new(
        entity,
        PriceKey::new(price_id, price_list, Currency::new("EUR")),
        PriceInnerRecordHandling::None,
        100,
        121,
    )
}
