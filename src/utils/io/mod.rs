//! File output utilities

pub mod parquet;

pub use self::parquet::write_parquet;
