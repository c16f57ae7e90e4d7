//! Facet Index Integration Tests
//!
//! Tests the facet index family through the public API:
//! - Bottom-up pruning after removals
//! - Facet to group reverse lookup
//! - Storage part round trips
//! - Staged mutations and commit

#[path = "../common/mod.rs"]
mod common;

mod reverse_index;
mod round_trip;
mod scenarios;
