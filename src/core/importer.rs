//! Import orchestration
//!
//! Drives the pipeline stages in sequence per batch, publishes progress to
//! the registered observer, and accumulates the final report. This module
//! owns no business logic beyond sequencing, back-pressure, and aggregation:
//! a batch's storage commit must return before the next batch starts, and a
//! cancellation signal is honored at batch boundaries, leaving previously
//! committed batches intact.

use crate::core::converter;
use crate::core::dedup::{DuplicateCheck, DuplicateDetector, Fingerprint};
use crate::core::resolver::{EntityResolver, ResolvedRow};
use crate::core::storage::StorageCoordinator;
use crate::core::traits::{EntityDirectory, FingerprintSource};
use crate::core::validator::{self, RowValidator};
use crate::io::{parser, Dialect};
use crate::types::{
    ColumnMapping, EntityMapping, ImportError, ImportOptions, ImportReport, ImportStage,
    ImportStatistics, ProgressObserver, ProgressSnapshot, RowIndex, RowOutcome, Transaction,
};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrates one import run at a time over shared storage
///
/// The coordinator itself is stateless between runs; the entity cache and
/// fingerprint detector are created per run and discarded with it. Only the
/// [`StorageCoordinator`] is process-wide shared state.
pub struct ImportCoordinator {
    options: ImportOptions,
    storage: StorageCoordinator,
    directory: Arc<dyn EntityDirectory>,
    fingerprints: Arc<dyn FingerprintSource>,
}

impl ImportCoordinator {
    pub fn new(
        options: ImportOptions,
        storage: StorageCoordinator,
        directory: Arc<dyn EntityDirectory>,
        fingerprints: Arc<dyn FingerprintSource>,
    ) -> Self {
        Self {
            options,
            storage,
            directory,
            fingerprints,
        }
    }

    /// Run the full pipeline over a text buffer
    ///
    /// # Errors
    ///
    /// Only input-shaped errors abort the run: [`ImportError::MalformedInput`]
    /// from the parser and [`ImportError::IncompleteMapping`] from the column
    /// mapping. Everything else is captured per row or per batch in the
    /// returned report.
    pub async fn run(
        &self,
        text: &str,
        dialect: &Dialect,
        columns: &ColumnMapping,
        entities: &EntityMapping,
        observer: Option<Arc<dyn ProgressObserver>>,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, ImportError> {
        let started_at = Utc::now();
        let started = Instant::now();

        columns.validate()?;

        publish(&observer, 0, 0, ImportStage::Parsing);
        let parsed = parser::parse(text, dialect)?;
        let total = parsed.rows.len() as u32;
        info!(
            total_rows = total,
            batch_size = self.options.batch_size,
            workers = self.options.validator_workers,
            "starting import"
        );

        let validator = Arc::new(RowValidator::new(columns.clone(), self.options.clone()));
        let mut resolver = EntityResolver::new(
            entities.clone(),
            self.options.unmapped_policy,
            self.options.cache_capacity,
            Arc::clone(&self.directory),
        );
        let mut detector = DuplicateDetector::new();
        let mut outcomes: BTreeMap<RowIndex, RowOutcome> = BTreeMap::new();
        let mut processed: u32 = 0;

        for batch in parsed.rows.chunks(self.options.batch_size.max(1)) {
            if cancel.is_cancelled() {
                info!(processed, total, "import cancelled at batch boundary");
                break;
            }

            publish(&observer, processed, total, ImportStage::Validating);
            let results =
                validator::validate_batch(Arc::clone(&validator), batch.to_vec()).await;

            publish(&observer, processed, total, ImportStage::Resolving);
            let mut resolved_rows: Vec<ResolvedRow> = Vec::with_capacity(results.len());
            for (index, result) in results {
                match result {
                    Ok(row) => match resolver.resolve(row) {
                        Ok(resolved) => resolved_rows.push(resolved),
                        Err(error) => {
                            outcomes.insert(
                                index,
                                RowOutcome::Invalid {
                                    errors: vec![error],
                                },
                            );
                        }
                    },
                    Err(errors) => {
                        outcomes.insert(index, RowOutcome::Invalid { errors });
                    }
                }
            }

            publish(&observer, processed, total, ImportStage::DetectingDuplicates);
            self.seed_detector(&mut detector, &resolved_rows);
            let mut unique: Vec<ResolvedRow> = Vec::with_capacity(resolved_rows.len());
            for row in resolved_rows {
                let fingerprint = Fingerprint::of_row(&row);
                match detector.check_and_record(&fingerprint, row.index) {
                    DuplicateCheck::Unique => unique.push(row),
                    DuplicateCheck::DuplicateOfRow(first) => {
                        outcomes.insert(row.index, RowOutcome::Duplicate { of_row: Some(first) });
                    }
                    DuplicateCheck::DuplicateOfStored => {
                        outcomes.insert(row.index, RowOutcome::Duplicate { of_row: None });
                    }
                }
            }

            publish(&observer, processed, total, ImportStage::Converting);
            let indices: Vec<RowIndex> = unique.iter().map(|row| row.index).collect();
            let transactions: Vec<Transaction> =
                unique.into_iter().map(converter::convert).collect();

            publish(&observer, processed, total, ImportStage::Committing);
            if !transactions.is_empty() {
                match self.storage.commit(transactions).await {
                    Ok(()) => {
                        for index in &indices {
                            outcomes.insert(*index, RowOutcome::Imported);
                        }
                    }
                    Err(error) => {
                        warn!(%error, rows = indices.len(), "batch failed to commit, continuing");
                        for index in &indices {
                            outcomes.insert(
                                *index,
                                RowOutcome::StorageFailed {
                                    message: error.to_string(),
                                },
                            );
                        }
                    }
                }
            }

            processed += batch.len() as u32;
            debug!(processed, total, "batch complete");
            publish(&observer, processed, total, ImportStage::Committing);
        }

        let finished_at = Utc::now();
        let statistics =
            ImportStatistics::from_outcomes(&outcomes, started_at, finished_at, started.elapsed());
        publish(&observer, processed, total, ImportStage::Finished);
        info!(
            imported = statistics.imported,
            duplicates = statistics.duplicates,
            errors = statistics.errors,
            rows_per_second = statistics.rows_per_second,
            "import finished"
        );

        Ok(ImportReport {
            outcomes,
            statistics,
        })
    }

    /// Seed the detector with stored fingerprints overlapping this batch
    ///
    /// The window is the batch's date range padded by the configured number
    /// of days. Re-seeding across batches is harmless: persisted markers
    /// never displace in-file first occurrences.
    fn seed_detector(&self, detector: &mut DuplicateDetector, rows: &[ResolvedRow]) {
        let mut dates = rows.iter().map(|row| row.date);
        let Some(first) = dates.next() else {
            return;
        };
        let (min, max) = dates.fold((first, first), |(min, max), date| {
            (min.min(date), max.max(date))
        });

        let padding = ChronoDuration::days(self.options.dedup_window_days as i64);
        let start: NaiveDate = min - padding;
        let end: NaiveDate = max + padding;
        for fingerprint in self.fingerprints.fingerprints_in(start, end) {
            detector.seed_persisted(fingerprint);
        }
    }
}

fn publish(
    observer: &Option<Arc<dyn ProgressObserver>>,
    rows_processed: u32,
    total_rows: u32,
    stage: ImportStage,
) {
    if let Some(observer) = observer {
        observer.on_progress(ProgressSnapshot {
            rows_processed,
            total_rows,
            stage,
        });
    }
}
