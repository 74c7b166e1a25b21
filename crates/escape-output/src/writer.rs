//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, PredatorSnapshotRow, PreySnapshotRow, TickSummaryRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// All methods are infallible from the observer's perspective — errors are
/// stored internally and retrieved with [`SimOutputObserver::take_error`]
/// (`crate::observer::SimOutputObserver`).
pub trait OutputWriter {
    /// Write a batch of prey snapshots.
    fn write_prey_snapshots(&mut self, rows: &[PreySnapshotRow]) -> OutputResult<()>;

    /// Write a batch of predator snapshots.
    fn write_predator_snapshots(&mut self, rows: &[PredatorSnapshotRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
