//! Builders for output columns
//!
//! Output tables keep the input's encounter column type and timestamp timezone, so
//! columns are built in a canonical type and cast to the requested one.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::error::ArrowError;
use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::models::EncounterId;
use crate::schema::ENCOUNTER_BLOCK;
use crate::utils::arrow::array_utils::cast_column;

/// Build an `encounter_block` column of the given type
pub fn encounter_array<'a, I>(ids: I, target: &DataType) -> Result<ArrayRef>
where
    I: IntoIterator<Item = &'a EncounterId>,
{
    let ids: Vec<&EncounterId> = ids.into_iter().collect();
    let all_int = ids.iter().all(|id| id.is_int());

    let array: ArrayRef = if all_int && target.is_integer() {
        Arc::new(Int64Array::from_iter_values(ids.iter().filter_map(|id| match id {
            EncounterId::Int(value) => Some(*value),
            EncounterId::Text(_) => None,
        })))
    } else {
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(ToString::to_string),
        ))
    };

    cast_column(&array, ENCOUNTER_BLOCK, target)
}

/// Build a timestamp column in the unit and timezone of `target`
///
/// Values finer than the target unit are truncated toward the past.
pub fn timestamp_array<I>(values: I, target: &DataType) -> Result<ArrayRef>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let DataType::Timestamp(unit, tz) = target else {
        return Err(Error::invalid_data_type("timestamp output", "Timestamp", target));
    };
    let values = values.into_iter().map(|value| value.and_utc());

    let array: ArrayRef = match unit {
        TimeUnit::Second => Arc::new(
            TimestampSecondArray::from_iter_values(values.map(|v| v.timestamp()))
                .with_timezone_opt(tz.clone()),
        ),
        TimeUnit::Millisecond => Arc::new(
            TimestampMillisecondArray::from_iter_values(values.map(|v| v.timestamp_millis()))
                .with_timezone_opt(tz.clone()),
        ),
        TimeUnit::Microsecond => Arc::new(
            TimestampMicrosecondArray::from_iter_values(values.map(|v| v.timestamp_micros()))
                .with_timezone_opt(tz.clone()),
        ),
        TimeUnit::Nanosecond => {
            let nanos = values
                .map(|v| {
                    v.timestamp_nanos_opt().ok_or_else(|| {
                        ArrowError::ComputeError(format!(
                            "timestamp {v} is out of range for nanoseconds"
                        ))
                    })
                })
                .collect::<std::result::Result<Vec<i64>, ArrowError>>()?;
            Arc::new(TimestampNanosecondArray::from(nanos).with_timezone_opt(tz.clone()))
        }
    };
    Ok(array)
}

/// Build a nullable text column
#[must_use]
pub fn optional_string_array<'a, I>(values: I) -> ArrayRef
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    Arc::new(values.into_iter().collect::<StringArray>())
}
