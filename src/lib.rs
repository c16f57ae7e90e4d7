//! Tessera - transactional facet and price indexes
//!
//! Tessera keeps the secondary indexes of an entity catalog: which entities
//! reference a facet (brand, category, ...) and which prices an entity has
//! per price list, currency and validity window.
//!
//! # Quick Start
//!
//! ```ignore
//! use tessera::{FacetIndex, ReferenceKey, Transaction, Writer};
//!
//! let index = FacetIndex::new();
//! let mut tx = Transaction::new();
//! FacetIndex::add_facet(Writer::staged(&index, &mut tx), &ReferenceKey::new("brand", 5), Some(10), 100);
//!
//! // Other readers still see the committed base
//! assert_eq!(index.size(None), 0);
//!
//! let index = tx.commit(|maintainer| maintainer.get_state_copy_with_committed_changes(&index))?;
//! ```
//!
//! # Architecture
//!
//! - `tessera-core`: identifiers, keys, price records, config and errors
//! - `tessera-concurrency`: transactions and overlay containers
//! - `tessera-index`: facet and price indexes, storage parts

pub use tessera_concurrency::{
    project, BitmapChanges, MapChanges, ReferenceChange, Transaction, TransactionalBitmap,
    TransactionalLayerMaintainer, TransactionalLayerProducer, TransactionalMap,
    TransactionalReference, TransactionalSet, Writer,
};
pub use tessera_core::{
    Bitmap, Currency, DateTimeRange, Identity, IndexConfig, IndexError, IndexResult,
    InternalPriceId, PriceIndexKey, PriceInnerRecordHandling, PriceKey, PriceRecord, PrimaryKey,
    ReferenceKey, StructureId, VersionSequencer,
};
pub use tessera_index::{
    FacetEntityTypeIndex, FacetGroupIndex, FacetGroupSnapshot, FacetIdIndex, FacetIdSnapshot,
    FacetIndex, FacetIndexStoragePart, InternalPriceIdSequence, PriceBucketCore, PriceIndex,
    PriceListAndCurrencyIndex, PriceListAndCurrencyRefIndex, PriceListAndCurrencySuperIndex,
    PriceMutation, PriceRefIndex, PriceRefStoragePart, PriceSuperIndex, PriceSuperStoragePart,
    RangeIndex, RangePointSnapshot, StoragePart, SuperIndexHandle, SuperIndexRegistry,
};
