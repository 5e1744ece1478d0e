//! Shared utilities
//!
//! - [`arrow`]: column lookup, extraction and output column builders
//! - [`io`]: Parquet output
//! - [`time`]: hour/duration conversions and window bounds
//! - [`partition`]: per-encounter partitioning and parallel fan-out
//! - [`logging`]: log helpers and progress spinners

pub mod arrow;
pub mod io;
pub mod logging;
pub mod partition;
pub mod time;

pub use logging::{log_operation_complete, log_operation_start, log_warning};
