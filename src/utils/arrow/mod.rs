//! Arrow data handling utilities
//!
//! Helpers for locating, type-checking and extracting input columns, and for
//! building output columns in the layout of the input table.

pub mod array_utils;
pub mod builders;
pub mod extractors;

// Re-export commonly used functions for convenience
pub use array_utils::{cast_column, cast_column_strict, downcast_array, get_column};
pub use builders::{encounter_array, optional_string_array, timestamp_array};
pub use extractors::{
    extract_encounter_ids, extract_identifiers, extract_numeric, extract_strings,
    extract_timestamps,
};
