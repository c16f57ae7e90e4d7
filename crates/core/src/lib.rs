//! Core types for Tessera
//!
//! This crate defines the foundational types used throughout the indexing layer:
//! - StructureId / Identity: per-instance identity issued by the version sequencer
//! - ReferenceKey: facet reference (entity type + referenced primary key)
//! - PriceKey / PriceIndexKey: price identification and price bucket addressing
//! - PriceRecord: the canonical price payload shared between super and ref indexes
//! - DateTimeRange: temporal validity of a price
//! - Bitmap: immutable ordered set of primary keys
//! - Sorted array helpers
//! - IndexConfig: tunables loaded from TOML
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod bitmap;
pub mod config;
pub mod error;
pub mod id;
pub mod price;
pub mod range;
pub mod types;

pub use bitmap::Bitmap;
pub use config::IndexConfig;
pub use error::{IndexError, IndexResult};
pub use id::{Identity, StructureId, VersionSequencer};
pub use price::PriceRecord;
pub use range::DateTimeRange;
pub use types::{
    Currency, InternalPriceId, PriceIndexKey, PriceInnerRecordHandling, PriceKey, PrimaryKey,
    ReferenceKey,
};
