//! Async file discovery for Parquet inputs

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

use crate::error::Result;
use crate::utils::{log_operation_complete, log_operation_start, log_warning};

/// Find all Parquet files in a directory asynchronously
///
/// Files are returned sorted by path so that tables spread over several files are
/// always read in the same order.
///
/// # Errors
/// Returns an error if the directory cannot be read
pub async fn find_parquet_files_async(dir: &Path) -> Result<Vec<PathBuf>> {
    log_operation_start("Searching for parquet files in", dir);

    let mut parquet_files = Vec::<PathBuf>::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = fs::metadata(&path).await?;
        if metadata.is_file() && path.extension().is_some_and(|ext| ext == "parquet") {
            parquet_files.push(path);
        }
    }
    parquet_files.sort();

    if parquet_files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    } else {
        log_operation_complete("found", dir, parquet_files.len(), None);
    }

    Ok(parquet_files)
}

/// Resolve an input path to the Parquet files it denotes
///
/// A directory expands to the Parquet files it contains; anything else is taken
/// as a single file.
pub async fn resolve_parquet_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if fs::metadata(path).await?.is_dir() {
        find_parquet_files_async(path).await
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// Async helper to open a Parquet file for reading
pub async fn open_parquet_file_async(path: &Path) -> Result<File> {
    Ok(File::open(path).await?)
}
