//! Operation logging
//!
//! One-line `info` records for file and table operations, so a run can be followed
//! from the log alone.

use std::path::Path;
use std::time::Duration;

use arrow::record_batch::RecordBatch;

/// Log the start of a file operation
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log the completion of a file operation
///
/// # Arguments
/// * `operation` - Past-tense verb for the operation, e.g. "read"
/// * `path` - Path of the file or directory that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, items: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {operation} {items} items from {} in {duration:?}",
            path.display()
        ),
        None => log::info!("Successfully {operation} {items} items from {}", path.display()),
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}

/// Log the size and columns of a derived table
pub fn log_table_summary(name: &str, batch: &RecordBatch) {
    let columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|field| format!("{} ({})", field.name(), field.data_type()))
        .collect();
    log::info!(
        "{name}: {} rows, columns [{}]",
        batch.num_rows(),
        columns.join(", ")
    );
}
