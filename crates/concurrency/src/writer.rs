//! Write access to a transactional structure
//!
//! Every mutating operation takes a `Writer`:
//!
//! - `Writer::Direct(&mut T)` is the bulk/warm-up fast path used while a
//!   catalog is loaded: no transaction exists and mutations go straight into
//!   the base, without any copy-on-write overhead.
//! - `Writer::Staged(&T, &mut Transaction)` only reads the base and records
//!   every mutation in the transaction's layers. Holding `&T` is what lets
//!   readers keep traversing the same base concurrently.
//!
//! Nested structures hand a `Writer` for their fields down with `project!`.

use crate::producer::TransactionalLayerProducer;
use crate::transaction::Transaction;

/// Direct or staged write access to `T`
pub enum Writer<'a, T> {
    /// Mutate the base in place (no transaction)
    Direct(&'a mut T),
    /// Stage mutations into the transaction overlay
    Staged(&'a T, &'a mut Transaction),
}

impl<'a, T> Writer<'a, T> {
    /// Direct access for bulk loading
    pub fn direct(target: &'a mut T) -> Self {
        Writer::Direct(target)
    }

    /// Staged access within `transaction`
    pub fn staged(target: &'a T, transaction: &'a mut Transaction) -> Self {
        Writer::Staged(target, transaction)
    }

    /// Read access to the target structure
    pub fn target(&self) -> &T {
        match self {
            Writer::Direct(target) => &**target,
            Writer::Staged(target, _) => &**target,
        }
    }

    /// Transaction to read through, `None` in direct mode
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Writer::Direct(_) => None,
            Writer::Staged(_, transaction) => Some(&**transaction),
        }
    }

    /// Check if mutations are staged into a transaction
    pub fn is_staged(&self) -> bool {
        matches!(self, Writer::Staged(..))
    }

    /// Shorter-lived writer over the same target
    pub fn reborrow(&mut self) -> Writer<'_, T> {
        match self {
            Writer::Direct(target) => Writer::Direct(&mut **target),
            Writer::Staged(target, transaction) => Writer::Staged(&**target, &mut **transaction),
        }
    }

    /// Writer for one field of the target. See `project!`.
    pub fn project<U>(
        self,
        shared: impl FnOnce(&T) -> &U,
        exclusive: impl FnOnce(&mut T) -> &mut U,
    ) -> Writer<'a, U> {
        match self {
            Writer::Direct(target) => Writer::Direct(exclusive(target)),
            Writer::Staged(target, transaction) => Writer::Staged(shared(target), transaction),
        }
    }
}

impl<'a, T: TransactionalLayerProducer> Writer<'a, T> {
    /// The target's layer in the active transaction, created on demand.
    ///
    /// `None` means no transaction is active and the caller should mutate
    /// the base directly.
    pub fn layer(&mut self) -> Option<&mut T::Layer> {
        match self {
            Writer::Direct(_) => None,
            Writer::Staged(target, transaction) => Some(transaction.get_or_create_layer(*target)),
        }
    }
}

/// Project a `Writer` onto a named field of its target
///
/// ```ignore
/// let added = TransactionalBitmap::add(project!(writer, records), entity_pk);
/// ```
#[macro_export]
macro_rules! project {
    ($writer:expr, $field:ident) => {
        $writer.project(|target| &target.$field, |target| &mut target.$field)
    };
}
