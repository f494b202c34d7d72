#![doc = include_str!("../README.md")]

pub mod batch;
pub mod dir;
pub mod memory;

use std::path::PathBuf;

use certlab_kernel::{
    verify, Certificate, Instance, InstanceId, KernelError, VerificationResult, VerifyError,
};
use thiserror::Error;

pub use batch::{default_workers, verify_batch};
pub use dir::{load_instance_file, DirStore};
pub use memory::MemoryStore;

/// Errors raised by an [`InstanceStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("instance '{id}' not found in store")]
    NotFound { id: String },
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode instance at {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: KernelError,
    },
    #[error("failed to encode instance '{id}': {source}")]
    Encode {
        id: String,
        #[source]
        source: KernelError,
    },
    #[error("instance '{id}' already exists with different content")]
    Conflict { id: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What a successful [`InstanceStore::put`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new record was written.
    Written,
    /// A byte-identical record was already stored under this id.
    Unchanged,
}

/// Persistent home of instance records.
///
/// Records are immutable once written: a `put` either stores a complete
/// record, leaves an identical one untouched, or fails without leaving a
/// partial record behind.
pub trait InstanceStore {
    /// Persist `instance` under its id.
    ///
    /// # Returns
    /// [`PutOutcome::Unchanged`] if identical bytes are already stored,
    /// [`StoreError::Conflict`] if different bytes are.
    fn put(&mut self, instance: &Instance) -> Result<PutOutcome, StoreError>;

    /// Load and integrity-check the instance stored under `id`.
    fn get(&self, id: &InstanceId) -> Result<Instance, StoreError>;

    fn contains(&self, id: &InstanceId) -> Result<bool, StoreError>;

    /// All stored ids, sorted.
    fn ids(&self) -> Result<Vec<InstanceId>, StoreError>;
}

/// Failure to produce a verification result for a certificate resolved
/// through a store.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Store(StoreError),
    #[error("verification worker panicked")]
    WorkerPanicked,
}

impl From<StoreError> for CheckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => CheckError::Verify(VerifyError::InstanceNotFound { id }),
            other => CheckError::Store(other),
        }
    }
}

/// Look up the instance a certificate references and verify it.
///
/// A missing instance is reported as [`VerifyError::InstanceNotFound`];
/// unreadable or corrupt records stay store errors.
pub fn verify_in_store<S>(
    store: &S,
    certificate: &Certificate,
) -> Result<VerificationResult, CheckError>
where
    S: InstanceStore + ?Sized,
{
    let instance = store.get(&certificate.instance_id)?;
    Ok(verify(&instance, certificate)?)
}
