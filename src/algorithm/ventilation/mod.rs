//! Intubation detection from ventilator settings
//!
//! A timestamp is an intubation timepoint when, within a symmetric window around
//! it and inside the same encounter, the ventilator table documents an IMV device,
//! a ventilator mode, an FiO2 setting and a PEEP setting. The four signals may come
//! from different rows.

pub mod window;

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use log::{debug, info};

use crate::adapters::{intubation_times_to_batch, observations_from_batches};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::models::{IntubationTimepoint, VentilatorObservation};
use crate::schema::{OutputTypes, RECORDED_DTTM};
use crate::utils::partition::par_map_encounters;

pub use window::{SignalCounts, qualifying_times};

/// Find the intubation timepoints in a set of ventilator observations
///
/// The result holds distinct `(encounter_block, recorded_dttm)` pairs sorted by
/// encounter and time. Encounters are scanned in parallel.
pub fn find_intubation_times(
    observations: &[VentilatorObservation],
    config: &ScanConfig,
) -> Result<Vec<IntubationTimepoint>> {
    config.validate()?;
    let start = Instant::now();
    let half_width = config.window();

    let mut sorted: Vec<&VentilatorObservation> = observations.iter().collect();
    sorted.sort_by(|a, b| {
        a.encounter_block
            .cmp(&b.encounter_block)
            .then_with(|| a.recorded_dttm.cmp(&b.recorded_dttm))
    });
    debug!("Sorted {} ventilator observations", sorted.len());

    let mut timepoints: Vec<IntubationTimepoint> = par_map_encounters(
        &sorted,
        |row| &row.encounter_block,
        |partition| {
            let Some(first) = partition.first() else {
                return Vec::new();
            };
            qualifying_times(partition, half_width)
                .into_iter()
                .map(|recorded_dttm| IntubationTimepoint {
                    encounter_block: first.encounter_block.clone(),
                    recorded_dttm,
                })
                .collect()
        },
    );
    timepoints.sort_unstable();
    timepoints.dedup();

    info!(
        "Found {} intubation timepoints in {} observations (window ±{}h) in {:?}",
        timepoints.len(),
        observations.len(),
        config.window_hours,
        start.elapsed()
    );

    Ok(timepoints)
}

/// Run the window scanner over a ventilator table
///
/// Every batch is validated before scanning starts. The output table has the
/// columns `encounter_block` and `recorded_dttm`; it is empty, but correctly typed,
/// when nothing qualifies.
pub fn scan_batches(batches: &[RecordBatch], config: &ScanConfig) -> Result<RecordBatch> {
    config.validate()?;
    let types = OutputTypes::from_batches(batches, &[RECORDED_DTTM]);
    let observations = observations_from_batches(batches)?;
    let timepoints = find_intubation_times(&observations, config)?;
    intubation_times_to_batch(&timepoints, &types)
}
