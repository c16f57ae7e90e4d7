//! Price index family
//!
//! ```text
//! PriceSuperIndex                          PriceRefIndex ── SuperIndexHandle
//!   └─ PriceIndexKey ─> super bucket          └─ PriceIndexKey ─> ref bucket
//!        ├─ internal id ─> PriceRecord              ├─ id / entity bitmaps
//!        ├─ entity ─> internal ids                  └─ validity index
//!        ├─ id / entity bitmaps                          │
//!        └─ validity index                               │
//!             ▲────────── records resolved by internal id ┘
//! ```
//!
//! Super buckets own their records and draw internal ids from the index
//! sequence. Ref buckets index a subset of the same prices and borrow the
//! records of the super bucket with the same key.

mod bucket;
mod index;
mod mutation;
mod ref_bucket;
mod registry;
mod sequence;
mod super_bucket;

pub use bucket::{PriceBucketCore, PriceListAndCurrencyIndex};
pub use index::{PriceIndex, PriceRefIndex, PriceSuperIndex};
pub use mutation::PriceMutation;
pub use ref_bucket::PriceListAndCurrencyRefIndex;
pub use registry::{SuperIndexHandle, SuperIndexRegistry};
pub use sequence::InternalPriceIdSequence;
pub use super_bucket::PriceListAndCurrencySuperIndex;
