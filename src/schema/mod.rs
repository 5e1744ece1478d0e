//! Column contracts for the input and output tables.
//!
//! Input tables must carry the required columns listed here; any extra columns are
//! ignored. Validation happens for every batch before any computation starts.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};

/// Encounter identifier column
pub const ENCOUNTER_BLOCK: &str = "encounter_block";
/// Ventilator observation timestamp
pub const RECORDED_DTTM: &str = "recorded_dttm";
/// Ventilator device category
pub const DEVICE_CATEGORY: &str = "device_category";
/// Ventilator mode category
pub const MODE_CATEGORY: &str = "mode_category";
/// Set FiO2
pub const FIO2_SET: &str = "fio2_set";
/// Set PEEP
pub const PEEP_SET: &str = "peep_set";

/// Patient identifier
pub const PATIENT_ID: &str = "patient_id";
/// Hospitalization identifier
pub const HOSPITALIZATION_ID: &str = "hospitalization_id";
/// Segment start
pub const IN_DTTM: &str = "in_dttm";
/// Segment end
pub const OUT_DTTM: &str = "out_dttm";
/// Coarse location category
pub const LOCATION_CATEGORY: &str = "location_category";
/// Finer-grained location label
pub const LOCATION_TYPE: &str = "location_type";

/// Stitched group identifier
pub const ICU_GROUP: &str = "icu_group";
/// Dense rank of a stitched group
pub const ICU_RANK: &str = "icu_rank";
/// Dense rank of a segment before stitching
pub const INITIAL_RANK: &str = "initial_rank";
/// Hours from the end of a group to the next segment
pub const OUT_TO_NEXT_ICU_HRS: &str = "out_to_next_icu_hrs";
/// Whether a segment links to its successor
pub const LINKED: &str = "linked";

/// Logical name of the ventilator table, used in error messages
pub const VENTILATOR_TABLE: &str = "ventilator";
/// Logical name of the ADT table, used in error messages
pub const ADT_TABLE: &str = "adt";

/// Columns the window scanner requires
pub const VENTILATOR_COLUMNS: [&str; 6] = [
    ENCOUNTER_BLOCK,
    RECORDED_DTTM,
    DEVICE_CATEGORY,
    MODE_CATEGORY,
    FIO2_SET,
    PEEP_SET,
];

/// Columns the interval stitcher requires
pub const ADT_COLUMNS: [&str; 7] = [
    PATIENT_ID,
    ENCOUNTER_BLOCK,
    HOSPITALIZATION_ID,
    IN_DTTM,
    OUT_DTTM,
    LOCATION_CATEGORY,
    LOCATION_TYPE,
];

/// Check that a schema contains every required column
pub fn validate_required_columns(
    schema: &Schema,
    table: &'static str,
    required: &[&str],
) -> Result<()> {
    for column in required {
        if schema.index_of(column).is_err() {
            return Err(Error::column_not_found(table, *column));
        }
    }
    Ok(())
}

/// Check every batch of a table before any of them is processed
///
/// Besides the required columns, `encounter_block` must have the same type in every
/// batch, since the output column is built in that type.
pub fn validate_batches(
    batches: &[RecordBatch],
    table: &'static str,
    required: &[&str],
) -> Result<()> {
    let mut encounter_type: Option<DataType> = None;
    for batch in batches {
        let schema = batch.schema();
        validate_required_columns(&schema, table, required)?;

        let Ok(field) = schema.field_with_name(ENCOUNTER_BLOCK) else {
            continue;
        };
        match &encounter_type {
            None => encounter_type = Some(field.data_type().clone()),
            Some(expected) if expected != field.data_type() => {
                return Err(Error::invalid_data_type(
                    ENCOUNTER_BLOCK,
                    format!("{expected} in every {table} batch"),
                    field.data_type(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn unit_precision(unit: &TimeUnit) -> u8 {
    match unit {
        TimeUnit::Second => 0,
        TimeUnit::Millisecond => 1,
        TimeUnit::Microsecond => 2,
        TimeUnit::Nanosecond => 3,
    }
}

/// Output timestamp type for a set of input timestamp column types
///
/// The finest input unit is kept, along with the first timezone found. Date-only
/// inputs produce timezone-less microsecond timestamps.
#[must_use]
pub fn output_timestamp_type(inputs: &[DataType]) -> DataType {
    let unit = inputs
        .iter()
        .filter_map(|data_type| match data_type {
            DataType::Timestamp(unit, _) => Some(unit),
            _ => None,
        })
        .max_by_key(|unit| unit_precision(unit))
        .cloned()
        .unwrap_or(TimeUnit::Microsecond);
    let tz = inputs.iter().find_map(|data_type| match data_type {
        DataType::Timestamp(_, Some(tz)) => Some(tz.clone()),
        _ => None,
    });
    DataType::Timestamp(unit, tz)
}

/// Data type of a named column in the first batch, if any
#[must_use]
pub fn first_column_type(batches: &[RecordBatch], column: &str) -> Option<DataType> {
    batches.first().and_then(|batch| {
        batch
            .schema()
            .field_with_name(column)
            .ok()
            .map(|field| field.data_type().clone())
    })
}

/// Output layout shared by every table the crate produces
///
/// The encounter column keeps the input's type; timestamps keep the input's unit and
/// timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTypes {
    /// Type of the `encounter_block` column
    pub encounter: DataType,
    /// Type of every timestamp column
    pub timestamp: DataType,
}

impl Default for OutputTypes {
    fn default() -> Self {
        Self {
            encounter: DataType::Utf8,
            timestamp: output_timestamp_type(&[]),
        }
    }
}

impl OutputTypes {
    /// Derive the output layout from the input batches and their timestamp columns
    #[must_use]
    pub fn from_batches(batches: &[RecordBatch], timestamp_columns: &[&str]) -> Self {
        let timestamp_types: Vec<DataType> = batches
            .iter()
            .flat_map(|batch| {
                let schema = batch.schema();
                timestamp_columns
                    .iter()
                    .filter_map(|column| {
                        schema
                            .field_with_name(column)
                            .ok()
                            .map(|field| field.data_type().clone())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self {
            encounter: first_column_type(batches, ENCOUNTER_BLOCK).unwrap_or(DataType::Utf8),
            timestamp: output_timestamp_type(&timestamp_types),
        }
    }
}

/// Schema of the intubation timepoint table
#[must_use]
pub fn intubation_schema(types: &OutputTypes) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ENCOUNTER_BLOCK, types.encounter.clone(), false),
        Field::new(RECORDED_DTTM, types.timestamp.clone(), false),
    ]))
}

/// Schema of the stitched ICU stay table
#[must_use]
pub fn icu_stay_schema(types: &OutputTypes) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ENCOUNTER_BLOCK, types.encounter.clone(), false),
        Field::new(ICU_GROUP, DataType::Int32, false),
        Field::new(ICU_RANK, DataType::Int32, false),
        Field::new(IN_DTTM, types.timestamp.clone(), false),
        Field::new(OUT_DTTM, types.timestamp.clone(), false),
        Field::new(LOCATION_TYPE, DataType::Utf8, true),
    ]))
}

/// Schema of the per-segment stitching detail table
#[must_use]
pub fn icu_segment_schema(types: &OutputTypes) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ENCOUNTER_BLOCK, types.encounter.clone(), false),
        Field::new(PATIENT_ID, DataType::Utf8, true),
        Field::new(HOSPITALIZATION_ID, DataType::Utf8, true),
        Field::new(IN_DTTM, types.timestamp.clone(), false),
        Field::new(OUT_DTTM, types.timestamp.clone(), false),
        Field::new(LOCATION_CATEGORY, DataType::Utf8, true),
        Field::new(LOCATION_TYPE, DataType::Utf8, true),
        Field::new(INITIAL_RANK, DataType::Int32, false),
        Field::new(OUT_TO_NEXT_ICU_HRS, DataType::Float64, true),
        Field::new(LINKED, DataType::Boolean, false),
        Field::new(ICU_GROUP, DataType::Int32, false),
    ]))
}
