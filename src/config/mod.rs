//! Configuration for the window scanner, the interval stitcher and the CLI pipeline.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::time::hours_to_duration;

/// Default half-width of the intubation detection window, in hours
pub const DEFAULT_WINDOW_HOURS: f64 = 1.0;

/// Default merge threshold between consecutive ICU segments, in hours
pub const DEFAULT_GAP_HOURS: f64 = 6.0;

/// Default batch size for Parquet reading and writing
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Configuration for the intubation window scanner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Half-width of the symmetric window around each timestamp
    pub window_hours: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl ScanConfig {
    /// Create a scan configuration with the given half-width
    #[must_use]
    pub const fn new(window_hours: f64) -> Self {
        Self { window_hours }
    }

    /// Check that the window is a finite, non-negative number of hours
    pub fn validate(&self) -> Result<()> {
        validate_hours("window_hours", self.window_hours)
    }

    /// The half-width as a duration
    #[must_use]
    pub fn window(&self) -> Duration {
        hours_to_duration(self.window_hours)
    }
}

/// Configuration for the ICU interval stitcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Segments closer than this many hours are merged (strict less-than)
    pub gap_hours: f64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            gap_hours: DEFAULT_GAP_HOURS,
        }
    }
}

impl StitchConfig {
    /// Create a stitch configuration with the given merge threshold
    #[must_use]
    pub const fn new(gap_hours: f64) -> Self {
        Self { gap_hours }
    }

    /// Check that the threshold is a finite, non-negative number of hours
    pub fn validate(&self) -> Result<()> {
        validate_hours("gap_hours", self.gap_hours)
    }
}

/// Configuration for a complete CLI run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Window scanner settings
    pub scan: ScanConfig,
    /// Interval stitcher settings
    pub stitch: StitchConfig,
    /// Number of worker threads for per-encounter processing (defaults to the CPU count)
    pub threads: Option<usize>,
    /// Batch size for Parquet reading and writing
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            stitch: StitchConfig::default(),
            threads: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Parse a pipeline configuration from a JSON document
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a pipeline configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate every section of the configuration
    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        self.stitch.validate()?;
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of worker threads to use
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

fn validate_hours(name: &str, hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "{name} must be a finite, non-negative number of hours (got {hours})"
        )));
    }
    Ok(())
}
