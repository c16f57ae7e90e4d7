//! Concurrency Integration Tests
//!
//! Tests the overlay transaction model across index structures.

#[path = "../common/mod.rs"]
mod common;

mod snapshot_isolation;
mod transaction_lifecycle;
