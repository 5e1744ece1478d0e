//! Column extraction utilities for Arrow record batches
//!
//! Each extractor checks the column's logical type, normalises it with a cast and
//! returns one `Option` per row. Nulls stay `None`; they are never coerced into a
//! value that could satisfy a predicate.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, PrimitiveArray, StringArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Date32Type, Date64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::models::EncounterId;
use crate::utils::arrow::array_utils::{
    cast_column, cast_column_strict, downcast_array, get_column, is_string_like,
};

/// Extract a timestamp column as naive UTC datetimes
///
/// Accepts timestamps of any unit (with or without timezone), `Date32` and `Date64`.
/// Values are read at the column's own unit, so nanosecond inputs keep full precision.
pub fn extract_timestamps(
    batch: &RecordBatch,
    table: &'static str,
    column_name: &str,
) -> Result<Vec<Option<NaiveDateTime>>> {
    let array = get_column(batch, table, column_name)?;

    // Stored values are UTC instants whatever the timezone annotation
    match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            datetimes::<TimestampSecondType>(&array, column_name, timestamp_s_to_datetime)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            datetimes::<TimestampMillisecondType>(&array, column_name, timestamp_ms_to_datetime)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            datetimes::<TimestampMicrosecondType>(&array, column_name, timestamp_us_to_datetime)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            datetimes::<TimestampNanosecondType>(&array, column_name, timestamp_ns_to_datetime)
        }
        DataType::Date32 => datetimes::<Date32Type>(&array, column_name, date32_to_datetime),
        DataType::Date64 => datetimes::<Date64Type>(&array, column_name, date64_to_datetime),
        other => Err(Error::invalid_data_type(
            column_name,
            "Timestamp, Date32 or Date64",
            other,
        )),
    }
}

fn datetimes<T: ArrowPrimitiveType>(
    array: &ArrayRef,
    column_name: &str,
    to_datetime: impl Fn(T::Native) -> Option<NaiveDateTime>,
) -> Result<Vec<Option<NaiveDateTime>>> {
    let values = downcast_array::<PrimitiveArray<T>>(array, column_name, "Timestamp")?;
    Ok(values
        .iter()
        .map(|value| value.and_then(&to_datetime))
        .collect())
}

/// Extract a text column
///
/// Accepts any string or dictionary-of-string column, or an all-null column.
pub fn extract_strings(
    batch: &RecordBatch,
    table: &'static str,
    column_name: &str,
) -> Result<Vec<Option<String>>> {
    let array = get_column(batch, table, column_name)?;
    let data_type = array.data_type();
    if !is_string_like(data_type) && *data_type != DataType::Null {
        return Err(Error::invalid_data_type(column_name, "a string type", data_type));
    }
    strings_from(&array, column_name)
}

/// Extract an identifier column as text
///
/// Accepts string and integer columns; integers are rendered in decimal.
pub fn extract_identifiers(
    batch: &RecordBatch,
    table: &'static str,
    column_name: &str,
) -> Result<Vec<Option<String>>> {
    let array = get_column(batch, table, column_name)?;
    let data_type = array.data_type();
    if !is_string_like(data_type) && !data_type.is_integer() && *data_type != DataType::Null {
        return Err(Error::invalid_data_type(
            column_name,
            "a string or integer type",
            data_type,
        ));
    }
    strings_from(&array, column_name)
}

/// Extract a numeric column as `f64`, treating NaN as missing
pub fn extract_numeric(
    batch: &RecordBatch,
    table: &'static str,
    column_name: &str,
) -> Result<Vec<Option<f64>>> {
    let array = get_column(batch, table, column_name)?;
    let data_type = array.data_type();
    if !data_type.is_numeric() && *data_type != DataType::Null {
        return Err(Error::invalid_data_type(column_name, "a numeric type", data_type));
    }

    let converted = cast_column(&array, column_name, &DataType::Float64)?;
    let values = downcast_array::<Float64Array>(&converted, column_name, "Float64")?;

    Ok(values
        .iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

/// Extract the `encounter_block` column
///
/// Integer columns yield [`EncounterId::Int`], string columns [`EncounterId::Text`].
/// Unsigned ids beyond `i64::MAX` are an error rather than a null.
pub fn extract_encounter_ids(
    batch: &RecordBatch,
    table: &'static str,
    column_name: &str,
) -> Result<Vec<Option<EncounterId>>> {
    let array = get_column(batch, table, column_name)?;
    let data_type = array.data_type();

    if data_type.is_integer() {
        let converted = cast_column_strict(&array, column_name, &DataType::Int64)?;
        let values = downcast_array::<Int64Array>(&converted, column_name, "Int64")?;
        return Ok(values.iter().map(|v| v.map(EncounterId::Int)).collect());
    }

    if is_string_like(data_type) {
        return Ok(strings_from(&array, column_name)?
            .into_iter()
            .map(|v| v.map(EncounterId::Text))
            .collect());
    }

    Err(Error::invalid_data_type(
        column_name,
        "a string or integer type",
        data_type,
    ))
}

fn strings_from(array: &ArrayRef, column_name: &str) -> Result<Vec<Option<String>>> {
    let converted = cast_column(array, column_name, &DataType::Utf8)?;
    let values = downcast_array::<StringArray>(&converted, column_name, "Utf8")?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}
