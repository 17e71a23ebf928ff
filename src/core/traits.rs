//! Collaborator contracts consumed by the pipeline
//!
//! These traits are the seams between the import engine and the host
//! application's persistence layer. The engine never reaches for ambient
//! global state; implementations are passed in explicitly and shared via
//! `Arc`, so they must be `Send + Sync`.

use crate::types::{AccountId, CategoryId, ImportError, Transaction};
use chrono::NaiveDate;

/// Entity lookup and on-the-fly creation
///
/// Raw column values that carry no explicit mapping are resolved against the
/// destination's existing entities, and (policy permitting) created when
/// nothing matches.
pub trait EntityDirectory: Send + Sync {
    /// Find an existing account whose name matches the raw value
    fn lookup_account(&self, raw: &str) -> Option<AccountId>;

    /// Find an existing category whose name matches the raw value
    fn lookup_category(&self, raw: &str) -> Option<CategoryId>;

    /// Create an account for the raw value, or return the existing one
    fn create_account(&self, raw: &str) -> Result<AccountId, ImportError>;

    /// Create a category for the raw value, or return the existing one
    fn create_category(&self, raw: &str) -> Result<CategoryId, ImportError>;
}

/// Persistence commit service
///
/// Accepts one batch at a time and must persist the transactions and update
/// every dependent aggregate (e.g. account balances) as one logical unit.
/// Callers never invoke this directly; all commits are funneled through the
/// [`StorageCoordinator`](crate::core::storage::StorageCoordinator), which
/// guarantees at most one in-flight call process-wide.
pub trait CommitBackend: Send + Sync {
    /// Persist a batch of transactions
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::StorageFailure`] when the batch cannot be
    /// committed. Earlier batches remain committed; the caller decides how
    /// to report the failed rows.
    fn commit_batch(&self, batch: Vec<Transaction>) -> Result<(), ImportError>;
}

/// Query service over fingerprints of already-persisted records
///
/// Used to seed duplicate detection with the stored records overlapping the
/// import's date window. Implementations return hex-encoded fingerprint
/// strings; the detector treats them as opaque set members.
pub trait FingerprintSource: Send + Sync {
    /// Fingerprints of stored records dated within `[start, end]` inclusive
    fn fingerprints_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<String>;
}
