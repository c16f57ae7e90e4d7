//! Registry of super price indexes
//!
//! Ref price indexes don't hold a pointer to the super index they mirror.
//! They keep a `SuperIndexHandle`, and callers resolve it here before a
//! mutation or record lookup. Replacing the registered index (for example
//! with the merged copy produced by a commit) re-points every ref index
//! holding the handle at once.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = SuperIndexRegistry::new();
//! let handle = registry.register(PriceSuperIndex::new(&config));
//!
//! let mut refs = PriceRefIndex::new(handle);
//! let source = registry.get(handle)?;
//! PriceRefIndex::add_price(Writer::direct(&mut refs), &source, &mutation)?;
//! ```

use super::index::PriceSuperIndex;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tessera_core::{IndexError, IndexResult};
use tracing::debug;

/// Stable handle of a registered super index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuperIndexHandle(usize);

impl SuperIndexHandle {
    /// Handle from its raw slot number
    pub const fn from_raw(slot: usize) -> Self {
        Self(slot)
    }

    /// Raw slot number
    pub const fn as_raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for SuperIndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "super#{}", self.0)
    }
}

/// Super price indexes addressable by handle
#[derive(Debug, Default)]
pub struct SuperIndexRegistry {
    slots: RwLock<Vec<Arc<PriceSuperIndex>>>,
}

impl SuperIndexRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a super index and return its handle
    pub fn register(&self, index: PriceSuperIndex) -> SuperIndexHandle {
        let mut slots = self.slots.write();
        slots.push(Arc::new(index));
        let handle = SuperIndexHandle(slots.len() - 1);
        debug!(target: "tessera::price", %handle, "Super index registered");
        handle
    }

    /// Super index currently registered under `handle`
    pub fn get(&self, handle: SuperIndexHandle) -> IndexResult<Arc<PriceSuperIndex>> {
        self.slots
            .read()
            .get(handle.0)
            .cloned()
            .ok_or(IndexError::UnknownSuperIndex(handle.0))
    }

    /// Swap the index under `handle` and return the previous one
    pub fn replace(
        &self,
        handle: SuperIndexHandle,
        index: PriceSuperIndex,
    ) -> IndexResult<Arc<PriceSuperIndex>> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(handle.0)
            .ok_or(IndexError::UnknownSuperIndex(handle.0))?;
        debug!(target: "tessera::price", %handle, "Super index replaced");
        Ok(std::mem::replace(slot, Arc::new(index)))
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}
