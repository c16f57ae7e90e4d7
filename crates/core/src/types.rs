//! Core types for the indexing layer
//!
//! This module defines the keys the indexes are addressed by:
//! - ReferenceKey: facet reference (entity type + referenced primary key)
//! - Currency: ISO currency code
//! - PriceKey: business identity of a price
//! - PriceInnerRecordHandling: how prices of inner records combine
//! - PriceIndexKey: one price bucket (price list + currency + handling mode)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of an indexed entity (non-negative 32-bit)
pub type PrimaryKey = u32;

/// Engine-private price id, distinct from the business price id
pub type InternalPriceId = u32;

/// Reference from an entity to another entity used as a facet
///
/// `entity_type` selects the facet entity type index, `primary_key` is the
/// facet id inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceKey {
    /// Type of the referenced entity
    pub entity_type: String,
    /// Primary key of the referenced entity (the facet id)
    pub primary_key: PrimaryKey,
}

impl ReferenceKey {
    /// Create a new reference key
    pub fn new(entity_type: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            entity_type: entity_type.into(),
            primary_key,
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.primary_key)
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a currency from its code
    pub fn new(code: impl Into<String>) -> Self {
        Currency(code.into())
    }

    /// The currency code
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Business identity of a price: external price id, price list and currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceKey {
    /// Externally visible price id
    pub price_id: u32,
    /// Price list name
    pub price_list: String,
    /// Currency
    pub currency: Currency,
}

impl PriceKey {
    /// Create a new price key
    pub fn new(price_id: u32, price_list: impl Into<String>, currency: Currency) -> Self {
        Self {
            price_id,
            price_list: price_list.into(),
            currency,
        }
    }
}

/// How prices of an entity's inner records are combined into a selling price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceInnerRecordHandling {
    /// Prices of inner records are ignored
    None,
    /// The lowest inner record price is the selling price
    LowestPrice,
    /// Inner record prices are summed
    Sum,
    /// Handling mode wasn't specified
    Unknown,
}

impl fmt::Display for PriceInnerRecordHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceInnerRecordHandling::None => "NONE",
            PriceInnerRecordHandling::LowestPrice => "LOWEST_PRICE",
            PriceInnerRecordHandling::Sum => "SUM",
            PriceInnerRecordHandling::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Identifies one price bucket: price list, currency and inner record handling
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceIndexKey {
    /// Price list name
    pub price_list: String,
    /// Currency
    pub currency: Currency,
    /// Inner record handling mode
    pub record_handling: PriceInnerRecordHandling,
}

impl PriceIndexKey {
    /// Create a new bucket key
    pub fn new(
        price_list: impl Into<String>,
        currency: Currency,
        record_handling: PriceInnerRecordHandling,
    ) -> Self {
        Self {
            price_list: price_list.into(),
            currency,
            record_handling,
        }
    }

    /// Bucket key of `price_key` under the given handling mode
    pub fn from_price_key(price_key: &PriceKey, record_handling: PriceInnerRecordHandling) -> Self {
        Self {
            price_list: price_key.price_list.clone(),
            currency: price_key.currency.clone(),
            record_handling,
        }
    }
}

impl fmt::Display for PriceIndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.price_list, self.currency, self.record_handling
        )
    }
}
