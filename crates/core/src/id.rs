//! Version sequencer and structure identity
//!
//! Every index structure instance receives a globally unique, monotonically
//! increasing id at construction time. The id keys the structure's overlay
//! layer inside a transaction and shows up in logs; it is never used for
//! equality or ordering of the indexed data.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one index structure instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u64);

impl StructureId {
    /// Raw numeric value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues structure ids from a single process-wide counter
pub struct VersionSequencer;

impl VersionSequencer {
    /// Next id; strictly greater than every id issued before
    pub fn next() -> StructureId {
        StructureId(SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity slot embedded in every transactional structure.
///
/// Cloning the slot draws a fresh id, so a cloned structure never shares
/// overlay layers with the instance it was cloned from.
#[derive(Debug)]
pub struct Identity(StructureId);

impl Identity {
    /// Draw a new identity from the sequencer
    pub fn new() -> Self {
        Identity(VersionSequencer::next())
    }

    /// The structure id held by this slot
    #[inline]
    pub fn id(&self) -> StructureId {
        self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Identity::new()
    }
}
