//! Price record payload
//!
//! A `PriceRecord` is owned by exactly one super index bucket and shared
//! (by `Arc`) with every ref index bucket that mirrors it.

use crate::range::DateTimeRange;
use crate::types::{InternalPriceId, PrimaryKey};
use serde::{Deserialize, Serialize};

/// Canonical price payload stored in a super index bucket
///
/// Prices are fixed-point integers, see `IndexConfig::to_indexed_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Engine-private id, unique within the owning super index
    pub internal_price_id: InternalPriceId,
    /// Externally visible price id
    pub price_id: u32,
    /// Entity the price belongs to
    pub entity_primary_key: PrimaryKey,
    /// Price including tax
    pub price_with_tax: i32,
    /// Price excluding tax
    pub price_without_tax: i32,
    /// Inner record the price is specific to, if any
    pub inner_record_id: Option<u32>,
    /// Validity the price was indexed with
    #[serde(default)]
    pub validity: DateTimeRange,
}

impl PriceRecord {
    /// Price record not bound to an inner record
    pub fn new(
        internal_price_id: InternalPriceId,
        price_id: u32,
        entity_primary_key: PrimaryKey,
        price_with_tax: i32,
        price_without_tax: i32,
    ) -> Self {
        Self {
            internal_price_id,
            price_id,
            entity_primary_key,
            price_with_tax,
            price_without_tax,
            inner_record_id: None,
            validity: DateTimeRange::infinite(),
        }
    }

    /// Price record specific to one inner record
    pub fn with_inner_record(
        internal_price_id: InternalPriceId,
        price_id: u32,
        entity_primary_key: PrimaryKey,
        inner_record_id: u32,
        price_with_tax: i32,
        price_without_tax: i32,
    ) -> Self {
        Self {
            inner_record_id: Some(inner_record_id),
            ..Self::new(
                internal_price_id,
                price_id,
                entity_primary_key,
                price_with_tax,
                price_without_tax,
            )
        }
    }

    /// Same record valid only in `validity`
    pub fn valid_in(self, validity: DateTimeRange) -> Self {
        Self { validity, ..self }
    }

    /// Check if the price belongs to an inner record
    pub fn is_inner_record_specific(&self) -> bool {
        self.inner_record_id.is_some()
    }
}
