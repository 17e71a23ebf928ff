//! Pipeline stages and orchestration
//!
//! Each stage is its own module, composed left-to-right by the
//! [`importer::ImportCoordinator`]:
//!
//! - [`validator`] - per-row checks, fanned out across workers
//! - [`resolver`] + [`cache`] - raw values to entity ids, LRU-bounded
//! - [`dedup`] - fingerprint-based duplicate detection
//! - [`converter`] - resolved rows to domain transactions
//! - [`storage`] - the process-wide single-writer commit queue
//!
//! [`traits`] defines the collaborator seams and [`in_memory`] a
//! dashmap-backed reference implementation of all of them.

pub mod cache;
pub mod converter;
pub mod dedup;
pub mod importer;
pub mod in_memory;
pub mod resolver;
pub mod storage;
pub mod traits;
pub mod validator;

pub use cache::LruCache;
pub use dedup::{DuplicateCheck, DuplicateDetector, Fingerprint};
pub use importer::ImportCoordinator;
pub use in_memory::InMemoryStore;
pub use resolver::{EntityResolver, ResolvedRow, ResolverStats};
pub use storage::StorageCoordinator;
pub use traits::{CommitBackend, EntityDirectory, FingerprintSource};
pub use validator::{RowValidator, ValidatedRow};
