//! Error types for the indexing layer
//!
//! Every variant is a precondition violation: the caller asked for something
//! the index contract forbids. Absence is never an error here, lookups of
//! unknown keys return `None` or empty bitmaps instead.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{PriceIndexKey, PrimaryKey};
use thiserror::Error;

/// Result type alias for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Error types for the indexing layer
#[derive(Debug, Error)]
pub enum IndexError {
    /// `remove_facet` targeted a reference type that has no facet index
    #[error("No facet index exists for reference type `{0}`")]
    UnknownReferenceType(String),

    /// `remove_facet` targeted a group that is not indexed for the reference type
    #[error("Facet group {group_id:?} is not indexed for reference type `{entity_type}`")]
    FacetNotIndexed {
        /// Reference type
        entity_type: String,
        /// Group that was expected to exist (`None` = ungrouped facets)
        group_id: Option<PrimaryKey>,
    },

    /// More than one ungrouped facet group was supplied for one reference type
    #[error("Only one ungrouped facet group index may exist for reference type `{0}`")]
    DuplicateUngroupedIndex(String),

    /// `price_remove` targeted a price bucket that doesn't exist
    #[error("Price index for {0} doesn't exist")]
    MissingPriceIndex(PriceIndexKey),

    /// A ref index referenced a price record its super index doesn't hold
    #[error("Price record {internal_price_id} is not present in super index bucket {key}")]
    MissingPriceRecord {
        /// Bucket that was searched
        key: PriceIndexKey,
        /// Internal price id that wasn't found
        internal_price_id: u32,
    },

    /// A ref index was asked to add a price without an internal price id
    #[error("Reference price index {0} requires an already assigned internal price id")]
    MissingInternalPriceId(PriceIndexKey),

    /// The internal price id is already present in the bucket
    #[error("Price {internal_price_id} is already indexed in {key}")]
    PriceAlreadyIndexed {
        /// Bucket
        key: PriceIndexKey,
        /// Internal price id
        internal_price_id: u32,
    },

    /// The internal price id is not present in the bucket
    #[error("Price {internal_price_id} is not indexed in {key}")]
    PriceNotIndexed {
        /// Bucket
        key: PriceIndexKey,
        /// Internal price id
        internal_price_id: u32,
    },

    /// The internal price id sequence has handed out its last id
    #[error("Internal price id sequence is exhausted")]
    InternalPriceIdsExhausted,

    /// A price validity ends before or where it starts
    #[error("Price validity of price {price_id} in {key} is empty: [{from}, {to})")]
    EmptyValidity {
        /// Bucket
        key: PriceIndexKey,
        /// Externally visible price id
        price_id: u32,
        /// Start threshold in microseconds
        from: i64,
        /// End threshold in microseconds
        to: i64,
    },

    /// A decimal price doesn't fit the fixed-point form
    #[error("Price {0} is out of range for the indexed fixed-point form")]
    PriceOutOfRange(f64),

    /// A super index handle doesn't point to a registered super index
    #[error("No super price index is registered under handle {0}")]
    UnknownSuperIndex(usize),

    /// Commit finished while overlay layers were still pending
    #[error("{count} transactional layer(s) were not consumed by commit of transaction {txn_id}")]
    UnconsumedLayers {
        /// Transaction that was committed
        txn_id: u64,
        /// Number of leftover layers
        count: usize,
    },

    /// Configuration could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<toml::de::Error> for IndexError {
    fn from(e: toml::de::Error) -> Self {
        IndexError::InvalidConfig(e.to_string())
    }
}
