//! Temporal validity index
//!
//! Records are half-open intervals `[from, to)` of microsecond thresholds.
//! Each threshold keeps the ids of records starting there and the ids of
//! records ending there, so a point query is a prefix scan:
//!
//! ```text
//! valid_at(p)           = ∪ starts(t ≤ p) − ∪ ends(t ≤ p)
//! overlapping([f, t))   = ∪ starts(s < t) − ∪ ends(e ≤ f)
//! ```
//!
//! Open bounds map to `i64::MIN` / `i64::MAX`.

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use tessera_concurrency::{
    project, Transaction, TransactionalLayerMaintainer, TransactionalLayerProducer,
    TransactionalMap, Writer,
};
use tessera_core::{Bitmap, DateTimeRange, Identity, StructureId};

/// Ids starting and ending at one threshold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangePoint {
    starts: RoaringBitmap,
    ends: RoaringBitmap,
}

impl RangePoint {
    fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.ends.is_empty()
    }
}

/// Persisted form of one threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePointSnapshot {
    /// Threshold in microseconds since the epoch
    pub threshold: i64,
    /// Ids of records whose interval starts here
    pub starts: Vec<u32>,
    /// Ids of records whose interval ends here
    pub ends: Vec<u32>,
}

/// Transactional index of record validity intervals
#[derive(Debug, Clone, Default)]
pub struct RangeIndex {
    identity: Identity,
    points: TransactionalMap<i64, RangePoint>,
}

impl RangeIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted thresholds
    pub fn from_snapshots(snapshots: &[RangePointSnapshot]) -> Self {
        Self {
            identity: Identity::new(),
            points: snapshots
                .iter()
                .map(|snapshot| {
                    let point = RangePoint {
                        starts: snapshot.starts.iter().copied().collect(),
                        ends: snapshot.ends.iter().copied().collect(),
                    };
                    (snapshot.threshold, point)
                })
                .collect(),
        }
    }

    /// Thresholds in ascending order
    pub fn snapshots(&self, tx: Option<&Transaction>) -> Vec<RangePointSnapshot> {
        self.points
            .iter(tx)
            .map(|(threshold, point)| RangePointSnapshot {
                threshold: *threshold,
                starts: point.starts.iter().collect(),
                ends: point.ends.iter().collect(),
            })
            .collect()
    }

    /// Check if no record is indexed
    pub fn is_empty(&self, tx: Option<&Transaction>) -> bool {
        self.points.is_empty(tx)
    }

    /// Register record `id` valid in `[from, to)`; callers reject empty intervals
    pub fn add_record(mut writer: Writer<'_, Self>, from: i64, to: i64, id: u32) {
        TransactionalMap::compute(project!(writer.reborrow(), points), from, |point| {
            let mut point = point.cloned().unwrap_or_default();
            point.starts.insert(id);
            Some(point)
        });
        TransactionalMap::compute(project!(writer, points), to, |point| {
            let mut point = point.cloned().unwrap_or_default();
            point.ends.insert(id);
            Some(point)
        });
    }

    /// Unregister record `id` previously added with `[from, to)`
    pub fn remove_record(mut writer: Writer<'_, Self>, from: i64, to: i64, id: u32) {
        TransactionalMap::compute(project!(writer.reborrow(), points), from, |point| {
            let mut point = point?.clone();
            point.starts.remove(id);
            (!point.is_empty()).then_some(point)
        });
        TransactionalMap::compute(project!(writer, points), to, |point| {
            let mut point = point?.clone();
            point.ends.remove(id);
            (!point.is_empty()).then_some(point)
        });
    }

    /// `add_record` over a date-time range
    pub fn add_range(writer: Writer<'_, Self>, range: &DateTimeRange, id: u32) {
        Self::add_record(writer, range.lower_bound(), range.upper_bound(), id);
    }

    /// `remove_record` over a date-time range
    pub fn remove_range(writer: Writer<'_, Self>, range: &DateTimeRange, id: u32) {
        Self::remove_record(writer, range.lower_bound(), range.upper_bound(), id);
    }

    /// Ids of records whose interval contains `point`
    pub fn records_valid_at(&self, tx: Option<&Transaction>, point: i64) -> Bitmap {
        let mut started = RoaringBitmap::new();
        let mut ended = RoaringBitmap::new();
        for (_, entry) in self.points.range(tx, ..=point) {
            started |= &entry.starts;
            ended |= &entry.ends;
        }
        Bitmap::from(started - ended)
    }

    /// Ids of records whose interval intersects `[from, to)`
    pub fn records_overlapping(&self, tx: Option<&Transaction>, from: i64, to: i64) -> Bitmap {
        let mut started = RoaringBitmap::new();
        let mut ended = RoaringBitmap::new();
        for (threshold, entry) in self.points.range(tx, ..to) {
            started |= &entry.starts;
            if *threshold <= from {
                ended |= &entry.ends;
            }
        }
        Bitmap::from(started - ended)
    }
}

impl TransactionalLayerProducer for RangeIndex {
    type Layer = ();

    fn structure_id(&self) -> StructureId {
        self.identity.id()
    }

    fn create_layer(&self) {}

    fn create_copy_with_merged_transactional_memory(
        &self,
        _layer: Option<()>,
        maintainer: &mut TransactionalLayerMaintainer<'_>,
    ) -> Self {
        Self {
            identity: Identity::new(),
            points: maintainer.get_state_copy_with_committed_changes(&self.points),
        }
    }

    fn clear_transactional_memory(&self, transaction: &mut Transaction) {
        self.points.clear_transactional_memory(transaction);
    }
}
