//! Persisted forms of the indexes
//!
//! Each part is self-contained: it carries the primary key of the owning
//! entity collection and enough state to rebuild one entity type index or
//! one price bucket. Parts of ref buckets store internal ids only; their
//! records are re-resolved from the super index on load.

use crate::range::RangePointSnapshot;
use serde::{Deserialize, Serialize};
use tessera_core::{PriceIndexKey, PriceRecord, PrimaryKey};

/// Entities of one facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIdSnapshot {
    pub facet_id: PrimaryKey,
    /// Sorted entity primary keys
    pub entity_ids: Vec<PrimaryKey>,
}

/// Facets of one group; `group_id` is `None` for ungrouped facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetGroupSnapshot {
    pub group_id: Option<u32>,
    pub facets: Vec<FacetIdSnapshot>,
}

/// Facet index of one referenced entity type
///
/// An empty `groups` list marks an entity type whose index was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIndexStoragePart {
    pub owner_primary_key: PrimaryKey,
    pub entity_type: String,
    pub groups: Vec<FacetGroupSnapshot>,
}

/// Super price bucket with its records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSuperStoragePart {
    pub owner_primary_key: PrimaryKey,
    pub key: PriceIndexKey,
    /// Records ordered by internal price id
    pub price_records: Vec<PriceRecord>,
    pub validity: Vec<RangePointSnapshot>,
}

/// Ref price bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRefStoragePart {
    pub owner_primary_key: PrimaryKey,
    pub key: PriceIndexKey,
    /// Sorted internal price ids
    pub price_ids: Vec<u32>,
    pub validity: Vec<RangePointSnapshot>,
}

/// Any persisted index part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoragePart {
    /// Facet index of one entity type
    Facet(FacetIndexStoragePart),
    /// Super price bucket
    PriceSuper(PriceSuperStoragePart),
    /// Ref price bucket
    PriceRef(PriceRefStoragePart),
}

impl StoragePart {
    /// Primary key of the owning entity collection
    pub fn owner_primary_key(&self) -> PrimaryKey {
        match self {
            StoragePart::Facet(part) => part.owner_primary_key,
            StoragePart::PriceSuper(part) => part.owner_primary_key,
            StoragePart::PriceRef(part) => part.owner_primary_key,
        }
    }
}

impl From<FacetIndexStoragePart> for StoragePart {
    fn from(part: FacetIndexStoragePart) -> Self {
        StoragePart::Facet(part)
    }
}

impl From<PriceSuperStoragePart> for StoragePart {
    fn from(part: PriceSuperStoragePart) -> Self {
        StoragePart::PriceSuper(part)
    }
}

impl From<PriceRefStoragePart> for StoragePart {
    fn from(part: PriceRefStoragePart) -> Self {
        StoragePart::PriceRef(part)
    }
}
