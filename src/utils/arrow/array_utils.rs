//! Utilities for working with Arrow arrays.
//!
//! This module provides helpers for looking up columns, checking their logical
//! type, normalising them with Arrow's cast kernel and downcasting the result.

use arrow::array::{Array, ArrayRef};
use arrow::compute::{CastOptions, cast, cast_with_options};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{Error, Result};

/// Get a required column from a record batch
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `table` - Logical table name, used in error messages
/// * `column_name` - The name of the column to extract
pub fn get_column(batch: &RecordBatch, table: &'static str, column_name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(column_name)
        .cloned()
        .ok_or_else(|| Error::column_not_found(table, column_name))
}

/// Cast a column to the target type unless it already has it
pub fn cast_column(array: &ArrayRef, column_name: &str, target: &DataType) -> Result<ArrayRef> {
    if array.data_type() == target {
        return Ok(array.clone());
    }
    debug!(
        "Converting column '{column_name}' from {:?} to {target:?}",
        array.data_type()
    );
    Ok(cast(array, target)?)
}

/// Cast a column to the target type, failing on values that do not fit
///
/// Unlike [`cast_column`], out-of-range values are an error instead of becoming null.
pub fn cast_column_strict(
    array: &ArrayRef,
    column_name: &str,
    target: &DataType,
) -> Result<ArrayRef> {
    if array.data_type() == target {
        return Ok(array.clone());
    }
    debug!(
        "Converting column '{column_name}' from {:?} to {target:?} (checked)",
        array.data_type()
    );
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    Ok(cast_with_options(array, target, &options)?)
}

/// Downcast a column to a specific array type with clear error messages
///
/// # Type Parameters
///
/// * `A` - The target array type to downcast to
///
/// # Arguments
///
/// * `array` - The array reference to downcast
/// * `column_name` - The name of the column (for error messages)
/// * `expected_type_name` - A human-readable name of the expected type (for error messages)
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| Error::invalid_data_type(column_name, expected_type_name, array.data_type()))
}

/// Whether the type holds text (plain, large, view or dictionary-encoded)
#[must_use]
pub fn is_string_like(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, value) => is_string_like(value),
        _ => false,
    }
}
