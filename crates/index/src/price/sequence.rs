//! Internal price id sequence of a super price index

use std::sync::atomic::{AtomicU64, Ordering};
use tessera_core::{IndexError, IndexResult, InternalPriceId};

/// Monotonic source of internal price ids.
///
/// Drawing is not transactional: ids handed out to an aborted transaction
/// are never reused. The sequence is shared by every merged copy of the
/// super index that created it. `u32::MAX` is the last id it hands out.
#[derive(Debug)]
pub struct InternalPriceIdSequence {
    next: AtomicU64,
}

impl InternalPriceIdSequence {
    /// Sequence whose first id is `first`
    pub fn starting_at(first: InternalPriceId) -> Self {
        Self {
            next: AtomicU64::new(u64::from(first)),
        }
    }

    /// Draw the next id
    ///
    /// # Errors
    ///
    /// `InternalPriceIdsExhausted` once `u32::MAX` has been drawn.
    pub fn next_id(&self) -> IndexResult<InternalPriceId> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= u64::from(InternalPriceId::MAX)).then_some(next + 1)
            })
            .ok()
            .and_then(|drawn| InternalPriceId::try_from(drawn).ok())
            .ok_or(IndexError::InternalPriceIdsExhausted)
    }

    /// Id the next draw returns, `None` when exhausted
    pub fn peek(&self) -> Option<InternalPriceId> {
        InternalPriceId::try_from(self.next.load(Ordering::Relaxed)).ok()
    }
}
