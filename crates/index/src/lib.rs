//! Transactional indexes for Tessera
//!
//! Two index families built on the overlay containers of
//! `tessera-concurrency`:
//! - facet: entity type → facet group → facet id → entity bitmap, with a
//!   reverse facet → group lookup
//! - price: per price list and currency buckets with validity indexes, in a
//!   super flavor owning the records and a ref flavor sharing them
//!
//! Every mutation takes a `Writer`: direct writes edit the base in place
//! (bulk load), staged writes go into a `Transaction` and become visible to
//! other readers only once the transaction is committed and the merged copy
//! published.
//!
//! Each index also produces `StoragePart`s for the structures it changed
//! since the last flush, and can be rebuilt from them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod facet;
pub mod price;
pub mod range;
pub mod storage_part;

pub use facet::{FacetEntityTypeIndex, FacetGroupIndex, FacetIdIndex, FacetIndex};
pub use price::{
    InternalPriceIdSequence, PriceBucketCore, PriceIndex, PriceListAndCurrencyIndex,
    PriceListAndCurrencyRefIndex, PriceListAndCurrencySuperIndex, PriceMutation, PriceRefIndex,
    PriceSuperIndex, SuperIndexHandle, SuperIndexRegistry,
};
pub use range::{RangeIndex, RangePointSnapshot};
pub use storage_part::{
    FacetGroupSnapshot, FacetIdSnapshot, FacetIndexStoragePart, PriceRefStoragePart,
    PriceSuperStoragePart, StoragePart,
};
