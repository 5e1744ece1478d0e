//! Parquet output
//!
//! Derived tables are written as a single Parquet file, replacing any existing file.

use std::fs::{self, File};
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Write a record batch to a Parquet file
///
/// Parent directories are created as needed. Row groups hold at most `batch_size` rows.
pub fn write_parquet(path: &Path, batch: &RecordBatch, batch_size: usize) -> Result<()> {
    let start = std::time::Instant::now();
    log_operation_start("Writing parquet file", path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let props = WriterProperties::builder()
        .set_max_row_group_size(batch_size.max(1))
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}
