//! Ventilator table adapter
//!
//! Converts ventilator record batches into [`VentilatorObservation`] rows and
//! intubation timepoints back into a record batch.

use arrow::record_batch::RecordBatch;
use itertools::izip;
use log::warn;

use crate::error::Result;
use crate::models::{IntubationTimepoint, VentilatorObservation};
use crate::schema::{
    DEVICE_CATEGORY, ENCOUNTER_BLOCK, FIO2_SET, MODE_CATEGORY, OutputTypes, PEEP_SET,
    RECORDED_DTTM, VENTILATOR_COLUMNS, VENTILATOR_TABLE, intubation_schema, validate_batches,
};
use crate::utils::arrow::{
    encounter_array, extract_encounter_ids, extract_numeric, extract_strings, extract_timestamps,
    timestamp_array,
};

/// Convert one ventilator batch into observations
///
/// Rows with a null `encounter_block` or `recorded_dttm` are skipped; the number of
/// skipped rows is returned alongside the observations.
pub fn observations_from_batch(batch: &RecordBatch) -> Result<(Vec<VentilatorObservation>, usize)> {
    let encounters = extract_encounter_ids(batch, VENTILATOR_TABLE, ENCOUNTER_BLOCK)?;
    let recorded = extract_timestamps(batch, VENTILATOR_TABLE, RECORDED_DTTM)?;
    let devices = extract_strings(batch, VENTILATOR_TABLE, DEVICE_CATEGORY)?;
    let modes = extract_strings(batch, VENTILATOR_TABLE, MODE_CATEGORY)?;
    let fio2 = extract_numeric(batch, VENTILATOR_TABLE, FIO2_SET)?;
    let peep = extract_numeric(batch, VENTILATOR_TABLE, PEEP_SET)?;

    let mut observations = Vec::with_capacity(batch.num_rows());
    let mut skipped = 0;

    for (encounter, recorded_dttm, device, mode, fio2, peep) in
        izip!(encounters, recorded, devices, modes, fio2, peep)
    {
        let (Some(encounter_block), Some(recorded_dttm)) = (encounter, recorded_dttm) else {
            skipped += 1;
            continue;
        };
        observations.push(VentilatorObservation {
            encounter_block,
            recorded_dttm,
            device_category: device,
            mode_category: mode,
            fio2_set: fio2,
            peep_set: peep,
        });
    }

    Ok((observations, skipped))
}

/// Convert a ventilator table into observations
///
/// Every batch is checked for the required columns before any row is converted.
pub fn observations_from_batches(batches: &[RecordBatch]) -> Result<Vec<VentilatorObservation>> {
    validate_batches(batches, VENTILATOR_TABLE, &VENTILATOR_COLUMNS)?;

    let mut observations = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut skipped = 0;
    for batch in batches {
        let (rows, batch_skipped) = observations_from_batch(batch)?;
        observations.extend(rows);
        skipped += batch_skipped;
    }

    if skipped > 0 {
        warn!(
            "Skipped {skipped} ventilator rows with a null {ENCOUNTER_BLOCK} or {RECORDED_DTTM}"
        );
    }

    Ok(observations)
}

/// Convert intubation timepoints into a record batch
pub fn intubation_times_to_batch(
    timepoints: &[IntubationTimepoint],
    types: &OutputTypes,
) -> Result<RecordBatch> {
    let schema = intubation_schema(types);
    let encounters = encounter_array(timepoints.iter().map(|t| &t.encounter_block), &types.encounter)?;
    let recorded = timestamp_array(timepoints.iter().map(|t| t.recorded_dttm), &types.timestamp)?;

    Ok(RecordBatch::try_new(schema, vec![encounters, recorded])?)
}
