//! Concurrency layer for Tessera
//!
//! This crate implements the copy-on-write overlay every index structure is
//! built on:
//! - Transaction: explicit side-table of per-structure overlay layers
//! - TransactionalLayerProducer: contract of a structure that can stage changes
//! - TransactionalLayerMaintainer: folds layers into fresh bases at commit
//! - Writer: direct (bulk load) or staged (transactional) write access
//! - Transactional containers: bitmap, map, set and reference
//!
//! # Isolation
//!
//! A committed base is never mutated by a transaction. Staged writes go into
//! the transaction's layers, reads performed with the same transaction see
//! them (read-your-writes), reads performed without it see only the base.
//! Commit builds new bases; abort drops the layers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitmap;
pub mod map;
pub mod producer;
pub mod reference;
pub mod set;
pub mod transaction;
pub mod writer;

pub use bitmap::{BitmapChanges, TransactionalBitmap};
pub use map::{MapChanges, TransactionalMap};
pub use producer::TransactionalLayerProducer;
pub use reference::{ReferenceChange, TransactionalReference};
pub use set::TransactionalSet;
pub use transaction::{Transaction, TransactionalLayerMaintainer};
pub use writer::Writer;
