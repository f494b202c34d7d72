//! Parallel verification of independent certificates.

use std::num::NonZeroUsize;
use std::thread;

use certlab_kernel::{Certificate, VerificationResult};
use tracing::info;

use crate::{verify_in_store, CheckError, InstanceStore};

/// Worker count used when the caller does not choose one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Verify every certificate against `store` on up to `workers` threads.
///
/// # Parameters
/// - `store`: Shared, read-only during the batch.
/// - `certificates`: Independent certificates; each is resolved by its
///   `instance_id`.
/// - `workers`: Thread count; `0` is treated as `1`.
///
/// # Returns
/// One entry per certificate, in input order.
pub fn verify_batch<S>(
    store: &S,
    certificates: &[Certificate],
    workers: usize,
) -> Vec<Result<VerificationResult, CheckError>>
where
    S: InstanceStore + Sync + ?Sized,
{
    let workers = workers.clamp(1, certificates.len().max(1));
    let mut slots: Vec<Option<Result<VerificationResult, CheckError>>> =
        (0..certificates.len()).map(|_| None).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                scope.spawn(move || {
                    certificates
                        .iter()
                        .enumerate()
                        .skip(worker)
                        .step_by(workers)
                        .map(|(index, certificate)| (index, verify_in_store(store, certificate)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            // Slots of a panicked worker stay empty and are reported below.
            if let Ok(done) = handle.join() {
                for (index, outcome) in done {
                    slots[index] = Some(outcome);
                }
            }
        }
    });

    let results: Vec<_> = slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(CheckError::WorkerPanicked)))
        .collect();
    let valid = results
        .iter()
        .filter(|r| matches!(r, Ok(result) if result.verdict))
        .count();
    info!(
        total = results.len(),
        valid,
        workers,
        "batch verification finished"
    );
    results
}
