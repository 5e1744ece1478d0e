//! ADT table adapter
//!
//! Converts ADT record batches into [`LocationEvent`] rows and stitching results
//! back into record batches.

use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, Int32Array};
use arrow::record_batch::RecordBatch;
use itertools::izip;
use log::warn;

use crate::error::Result;
use crate::models::{IcuSegment, IcuStayInterval, LocationEvent};
use crate::schema::{
    ADT_COLUMNS, ADT_TABLE, ENCOUNTER_BLOCK, HOSPITALIZATION_ID, IN_DTTM, LOCATION_CATEGORY,
    LOCATION_TYPE, OUT_DTTM, OutputTypes, PATIENT_ID, icu_segment_schema, icu_stay_schema,
    validate_batches,
};
use crate::utils::arrow::{
    encounter_array, extract_encounter_ids, extract_identifiers, extract_strings,
    extract_timestamps, optional_string_array, timestamp_array,
};

/// Convert one ADT batch into location events
///
/// Rows with a null `encounter_block`, `in_dttm` or `out_dttm` are skipped; the number
/// of skipped rows is returned alongside the events.
pub fn location_events_from_batch(batch: &RecordBatch) -> Result<(Vec<LocationEvent>, usize)> {
    let patients = extract_identifiers(batch, ADT_TABLE, PATIENT_ID)?;
    let encounters = extract_encounter_ids(batch, ADT_TABLE, ENCOUNTER_BLOCK)?;
    let hospitalizations = extract_identifiers(batch, ADT_TABLE, HOSPITALIZATION_ID)?;
    let ins = extract_timestamps(batch, ADT_TABLE, IN_DTTM)?;
    let outs = extract_timestamps(batch, ADT_TABLE, OUT_DTTM)?;
    let categories = extract_strings(batch, ADT_TABLE, LOCATION_CATEGORY)?;
    let types = extract_strings(batch, ADT_TABLE, LOCATION_TYPE)?;

    let mut events = Vec::with_capacity(batch.num_rows());
    let mut skipped = 0;

    for (patient_id, encounter, hospitalization_id, in_dttm, out_dttm, category, location_type) in
        izip!(patients, encounters, hospitalizations, ins, outs, categories, types)
    {
        let (Some(encounter_block), Some(in_dttm), Some(out_dttm)) = (encounter, in_dttm, out_dttm)
        else {
            skipped += 1;
            continue;
        };
        events.push(LocationEvent {
            patient_id,
            encounter_block,
            hospitalization_id,
            in_dttm,
            out_dttm,
            location_category: category,
            location_type,
        });
    }

    Ok((events, skipped))
}

/// Convert an ADT table into location events
///
/// Every batch is checked for the required columns before any row is converted.
pub fn location_events_from_batches(batches: &[RecordBatch]) -> Result<Vec<LocationEvent>> {
    validate_batches(batches, ADT_TABLE, &ADT_COLUMNS)?;

    let mut events = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut skipped = 0;
    for batch in batches {
        let (rows, batch_skipped) = location_events_from_batch(batch)?;
        events.extend(rows);
        skipped += batch_skipped;
    }

    if skipped > 0 {
        warn!(
            "Skipped {skipped} ADT rows with a null {ENCOUNTER_BLOCK}, {IN_DTTM} or {OUT_DTTM}"
        );
    }

    Ok(events)
}

/// Convert stitched ICU stays into a record batch
pub fn icu_stays_to_batch(stays: &[IcuStayInterval], types: &OutputTypes) -> Result<RecordBatch> {
    let schema = icu_stay_schema(types);
    let columns = vec![
        encounter_array(stays.iter().map(|s| &s.encounter_block), &types.encounter)?,
        Arc::new(Int32Array::from_iter_values(stays.iter().map(|s| rank_value(s.icu_group)))) as _,
        Arc::new(Int32Array::from_iter_values(stays.iter().map(|s| rank_value(s.icu_rank)))) as _,
        timestamp_array(stays.iter().map(|s| s.in_dttm), &types.timestamp)?,
        timestamp_array(stays.iter().map(|s| s.out_dttm), &types.timestamp)?,
        optional_string_array(stays.iter().map(|s| s.location_type.as_deref())),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Convert per-segment stitching detail into a record batch
pub fn icu_segments_to_batch(segments: &[IcuSegment], types: &OutputTypes) -> Result<RecordBatch> {
    let schema = icu_segment_schema(types);
    let events = || segments.iter().map(|s| &s.event);
    let columns = vec![
        encounter_array(events().map(|e| &e.encounter_block), &types.encounter)?,
        optional_string_array(events().map(|e| e.patient_id.as_deref())),
        optional_string_array(events().map(|e| e.hospitalization_id.as_deref())),
        timestamp_array(events().map(|e| e.in_dttm), &types.timestamp)?,
        timestamp_array(events().map(|e| e.out_dttm), &types.timestamp)?,
        optional_string_array(events().map(|e| e.location_category.as_deref())),
        optional_string_array(events().map(|e| e.location_type.as_deref())),
        Arc::new(Int32Array::from_iter_values(
            segments.iter().map(|s| rank_value(s.initial_rank)),
        )) as _,
        Arc::new(segments.iter().map(|s| s.out_to_next_hours).collect::<Float64Array>()) as _,
        Arc::new(segments.iter().map(|s| Some(s.linked)).collect::<BooleanArray>()) as _,
        Arc::new(Int32Array::from_iter_values(
            segments.iter().map(|s| rank_value(s.icu_group)),
        )) as _,
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

// Ranks and group numbers are bounded by the number of rows in one encounter
fn rank_value(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
