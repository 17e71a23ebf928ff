//! Single-writer storage coordination
//!
//! Every write to the destination store, from this import or from any other
//! part of the host process, must pass through one serialization point so
//! that concurrent save attempts never interleave at the storage-engine
//! level. The invariant is "at most one in-flight write at any time"; the
//! mechanism here is a message-passing queue consumed by a single writer
//! task.
//!
//! # Design
//!
//! ```text
//! caller A ──┐
//! caller B ──┼── mpsc queue ──► writer task ──► CommitBackend::commit_batch
//! caller C ──┘    (FIFO)        (one at a time)
//! ```
//!
//! The coordinator handle is cheaply cloneable; clones share the queue.
//! Requests are executed strictly in submission order and each caller gets
//! its own success/failure reply without blocking anyone's reads: readers go
//! to the backend directly, only writes are funneled here.
//!
//! A failed batch does not stop the writer. Earlier batches stay committed,
//! the error goes back to the submitting caller, and the queue keeps
//! draining.

use crate::core::traits::CommitBackend;
use crate::types::{ImportError, Transaction};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Queue depth before submitters are back-pressured
const QUEUE_DEPTH: usize = 32;

/// One enqueued commit: the batch plus the reply channel
struct CommitRequest {
    batch: Vec<Transaction>,
    reply: oneshot::Sender<Result<(), ImportError>>,
}

/// Cloneable handle to the process-wide storage writer
#[derive(Clone)]
pub struct StorageCoordinator {
    sender: mpsc::Sender<CommitRequest>,
}

impl StorageCoordinator {
    /// Spawn the writer task over a commit backend
    ///
    /// Must be called from within a tokio runtime. The writer runs until
    /// every coordinator handle has been dropped, then drains the queue and
    /// exits.
    pub fn new(backend: Arc<dyn CommitBackend>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<CommitRequest>(QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let size = request.batch.len();
                let result = backend.commit_batch(request.batch);
                match &result {
                    Ok(()) => debug!(rows = size, "batch committed"),
                    Err(error) => warn!(rows = size, %error, "batch commit rejected"),
                }
                // A dropped receiver means the submitter gave up waiting;
                // the commit outcome stands either way.
                let _ = request.reply.send(result);
            }
        });

        Self { sender }
    }

    /// Submit a batch and wait for its commit outcome
    ///
    /// Batches from all callers are committed strictly in submission order,
    /// one at a time.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ImportError::StorageFailure`] for this batch,
    /// or a synthetic one if the writer task is gone.
    pub async fn commit(&self, batch: Vec<Transaction>) -> Result<(), ImportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(CommitRequest {
                batch,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ImportError::storage_failure("storage writer has shut down"))?;

        reply_rx
            .await
            .map_err(|_| ImportError::storage_failure("storage writer dropped the reply"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn transaction(row: u32) -> Transaction {
        Transaction {
            kind: TransactionKind::Credit,
            amount: Decimal::new(100, 2),
            currency: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            description: format!("row {row}"),
            account: 1,
            category: None,
            source_row: row,
        }
    }

    /// Backend that records commit order and can fail selected batches
    struct RecordingBackend {
        committed: Mutex<Vec<Vec<u32>>>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl RecordingBackend {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                committed: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_on_call,
            }
        }
    }

    impl CommitBackend for RecordingBackend {
        fn commit_batch(&self, batch: Vec<Transaction>) -> Result<(), ImportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(ImportError::storage_failure("injected failure"));
            }
            self.committed
                .lock()
                .unwrap()
                .push(batch.iter().map(|t| t.source_row).collect());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_commit_reaches_backend() {
        let backend = Arc::new(RecordingBackend::new(None));
        let coordinator = StorageCoordinator::new(backend.clone());

        coordinator
            .commit(vec![transaction(1), transaction(2)])
            .await
            .unwrap();

        let committed = backend.committed.lock().unwrap();
        assert_eq!(committed.as_slice(), &[vec![1, 2]]);
    }

    #[tokio::test]
    async fn test_batches_commit_in_submission_order() {
        let backend = Arc::new(RecordingBackend::new(None));
        let coordinator = StorageCoordinator::new(backend.clone());

        for batch_no in 0..10u32 {
            coordinator
                .commit(vec![transaction(batch_no * 10)])
                .await
                .unwrap();
        }

        let committed = backend.committed.lock().unwrap();
        let order: Vec<u32> = committed.iter().map(|b| b[0]).collect();
        assert_eq!(order, (0..10).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let backend = Arc::new(RecordingBackend::new(Some(1)));
        let coordinator = StorageCoordinator::new(backend.clone());

        assert!(coordinator.commit(vec![transaction(1)]).await.is_ok());
        let failed = coordinator.commit(vec![transaction(2)]).await;
        assert!(matches!(
            failed,
            Err(ImportError::StorageFailure { .. })
        ));
        assert!(coordinator.commit(vec![transaction(3)]).await.is_ok());

        let committed = backend.committed.lock().unwrap();
        assert_eq!(committed.as_slice(), &[vec![1], vec![3]]);
    }

    #[tokio::test]
    async fn test_concurrent_submitters_never_interleave() {
        let backend = Arc::new(RecordingBackend::new(None));
        let coordinator = StorageCoordinator::new(backend.clone());

        let mut handles = Vec::new();
        for submitter in 0..8u32 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                let rows: Vec<Transaction> = (0..5)
                    .map(|i| transaction(submitter * 100 + i))
                    .collect();
                coordinator.commit(rows).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Every committed batch must be exactly one submitter's five rows
        let committed = backend.committed.lock().unwrap();
        assert_eq!(committed.len(), 8);
        for batch in committed.iter() {
            assert_eq!(batch.len(), 5);
            let base = batch[0] / 100;
            assert!(batch.iter().all(|row| row / 100 == base));
        }
    }
}
