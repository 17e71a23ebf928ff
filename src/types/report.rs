//! Progress and reporting types
//!
//! The orchestrator publishes immutable [`ProgressSnapshot`] values to a
//! caller-supplied [`ProgressObserver`] while a run is in flight, and returns
//! an [`ImportReport`] (per-row outcomes plus [`ImportStatistics`]) when the
//! run completes.

use crate::types::{RowIndex, ValidationError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pipeline stage currently being executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Parsing,
    Validating,
    Resolving,
    DetectingDuplicates,
    Converting,
    Committing,
    Finished,
}

/// Immutable progress snapshot pushed to the observer
///
/// `rows_processed` is monotonically non-decreasing across the snapshots of
/// one run; observers may coalesce snapshots freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Rows fully processed so far (through commit or exclusion)
    pub rows_processed: u32,

    /// Total data rows in the input
    pub total_rows: u32,

    /// Stage the pipeline is currently in
    pub stage: ImportStage,
}

/// Consumer-supplied progress sink
///
/// The pipeline makes no assumption about how fast the observer drains
/// updates; implementations should return promptly.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, snapshot: ProgressSnapshot);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        self(snapshot)
    }
}

/// Final disposition of a single data row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Committed to the destination store
    Imported,

    /// Excluded as a duplicate
    ///
    /// `of_row` names the earlier row in the same file this one duplicates,
    /// or is `None` when the matching transaction was already persisted
    /// before the run started.
    Duplicate { of_row: Option<RowIndex> },

    /// Excluded with one or more validation errors
    Invalid { errors: Vec<ValidationError> },

    /// Was valid and unique, but its batch failed to commit
    StorageFailed { message: String },
}

impl RowOutcome {
    /// Whether this outcome counts toward the error total
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RowOutcome::Invalid { .. } | RowOutcome::StorageFailed { .. }
        )
    }
}

/// Summary counters for one completed run
///
/// Computed once when the run finishes; `imported + duplicates + errors`
/// always equals `total_rows` (rows never reached due to a fatal abort or
/// cancellation are not counted).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportStatistics {
    pub total_rows: u32,
    pub imported: u32,
    pub duplicates: u32,
    pub errors: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_per_second: f64,
}

impl ImportStatistics {
    /// Derive statistics from the per-row outcomes and wall-clock timing
    pub fn from_outcomes(
        outcomes: &BTreeMap<RowIndex, RowOutcome>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let total_rows = outcomes.len() as u32;
        let imported = outcomes
            .values()
            .filter(|o| matches!(o, RowOutcome::Imported))
            .count() as u32;
        let duplicates = outcomes
            .values()
            .filter(|o| matches!(o, RowOutcome::Duplicate { .. }))
            .count() as u32;
        let errors = outcomes.values().filter(|o| o.is_error()).count() as u32;

        let secs = elapsed.as_secs_f64();
        let rows_per_second = if secs > 0.0 {
            total_rows as f64 / secs
        } else {
            0.0
        };

        Self {
            total_rows,
            imported,
            duplicates,
            errors,
            started_at,
            finished_at,
            rows_per_second,
        }
    }
}

/// Everything a caller learns about one completed run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Per-row outcome keyed by original file row index
    ///
    /// A BTreeMap keeps report iteration in file order regardless of how
    /// validation was scheduled.
    pub outcomes: BTreeMap<RowIndex, RowOutcome>,

    /// Summary counters for the run
    pub statistics: ImportStatistics,
}

impl ImportReport {
    /// Outcome for a specific row, if the row was reached
    pub fn outcome(&self, row: RowIndex) -> Option<&RowOutcome> {
        self.outcomes.get(&row)
    }
}
