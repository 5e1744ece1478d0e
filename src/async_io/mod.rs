//! Async Parquet loading
//! Reads input tables from single files or directories of Parquet files

pub mod batch_ops;
pub mod file_ops;

pub use batch_ops::{create_projection, read_parquet_async, read_table_async};
pub use file_ops::{find_parquet_files_async, open_parquet_file_async, resolve_parquet_inputs};
