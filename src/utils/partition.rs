//! Per-encounter partitioning
//!
//! Encounters are independent, so rows sorted by encounter are split into one
//! contiguous slice per encounter and processed on the rayon pool. Results are
//! concatenated in partition order.

use rayon::prelude::*;

use crate::models::EncounterId;

/// Split rows sorted by encounter into one slice per encounter
pub fn encounter_partitions<T, K>(rows: &[T], key: K) -> Vec<&[T]>
where
    K: Fn(&T) -> &EncounterId,
{
    rows.chunk_by(|a, b| key(a) == key(b)).collect()
}

/// Apply `f` to every encounter partition in parallel and concatenate the results
///
/// `rows` must already be sorted by encounter. The output keeps partition order.
pub fn par_map_encounters<T, R, K, F>(rows: &[T], key: K, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    K: Fn(&T) -> &EncounterId,
    F: Fn(&[T]) -> Vec<R> + Sync,
{
    let partitions = encounter_partitions(rows, key);
    log::debug!("Processing {} encounter partitions", partitions.len());

    partitions
        .par_iter()
        .map(|partition| f(partition))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
