//! Logging utilities for output and progress tracking

pub mod operations;
pub mod progress;

// Re-export commonly used functions for convenience
pub use operations::{log_operation_complete, log_operation_start, log_table_summary, log_warning};
pub use progress::{create_main_progress_bar, create_spinner, finish_progress_bar};
