//! Async Parquet batch reading
//!
//! Input tables are read with a projection onto the columns an algorithm needs;
//! any other columns in the files are never decoded.

use std::path::Path;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use futures::stream::{self, StreamExt};
use parquet::arrow::ProjectionMask;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use parquet::schema::types::SchemaDescriptor;

use super::file_ops::{open_parquet_file_async, resolve_parquet_inputs};
use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::Result;
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};
use crate::utils::{log_operation_complete, log_operation_start, log_warning};

/// Build a projection onto the named top-level columns
///
/// Columns absent from the file are skipped with a warning so that the schema
/// check reports them. Returns `None` when no column matched.
#[must_use]
pub fn create_projection(
    columns: &[&str],
    file_schema: &Schema,
    parquet_schema: &SchemaDescriptor,
) -> Option<ProjectionMask> {
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| match file_schema.index_of(name) {
            Ok(idx) => Some(idx),
            Err(_) => {
                log_warning(&format!("Column {name} not found in parquet file"), None);
                None
            }
        })
        .collect();

    if indices.is_empty() {
        None
    } else {
        Some(ProjectionMask::roots(parquet_schema, indices))
    }
}

/// Read a Parquet file asynchronously into Arrow record batches
///
/// # Arguments
/// * `path` - Path to the Parquet file
/// * `columns` - Optional column names to project onto
/// * `batch_size` - Optional batch size for reading (defaults to `DEFAULT_BATCH_SIZE`)
pub async fn read_parquet_async(
    path: &Path,
    columns: Option<&[&str]>,
    batch_size: Option<usize>,
) -> Result<Vec<RecordBatch>> {
    let start = std::time::Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = open_parquet_file_async(path).await?;
    let mut builder = ParquetRecordBatchStreamBuilder::new(file).await?;

    if let Some(columns) = columns {
        let projection =
            create_projection(columns, builder.schema().as_ref(), builder.parquet_schema());
        if let Some(mask) = projection {
            builder = builder.with_projection(mask);
        }
    }

    let stream = builder
        .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;
    let batches = stream.try_collect::<Vec<_>>().await?;

    log_operation_complete("read", path, batches.len(), Some(start.elapsed()));

    Ok(batches)
}

/// Read a table stored as one Parquet file or a directory of Parquet files
///
/// Files are read concurrently but their batches are concatenated in path order.
pub async fn read_table_async(
    path: &Path,
    columns: &[&str],
    batch_size: usize,
) -> Result<Vec<RecordBatch>> {
    let files = resolve_parquet_inputs(path).await?;
    let progress = create_main_progress_bar(files.len() as u64, Some("Reading parquet files"));
    let concurrency = num_cpus::get().max(1);

    let per_file = stream::iter(files.iter())
        .map(|file| {
            let progress = progress.clone();
            async move {
                let batches = read_parquet_async(file, Some(columns), Some(batch_size)).await;
                progress.inc(1);
                batches
            }
        })
        .buffered(concurrency)
        .try_collect::<Vec<Vec<RecordBatch>>>()
        .await?;

    finish_progress_bar(&progress, None);
    let batches: Vec<RecordBatch> = per_file.into_iter().flatten().collect();
    log::info!(
        "Loaded {} rows in {} batches from {}",
        batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
        batches.len(),
        path.display()
    );

    Ok(batches)
}
