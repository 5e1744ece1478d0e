//! Clinical timeline derivation over Arrow tables.
//!
//! Two algorithms turn raw EHR tables into derived event tables:
//!
//! - the window scanner finds intubation timepoints in a ventilator table, where an
//!   IMV device, a ventilator mode, an FiO2 setting and a PEEP setting are all
//!   documented within a window around the same time;
//! - the interval stitcher merges ICU and stepdown segments of an ADT table into
//!   ranked ICU stays, linking segments separated by less than a gap threshold.
//!
//! Tables are read from and written to Parquet. Encounters are processed in
//! parallel with rayon.

pub mod adapters;
pub mod algorithm;
pub mod async_io;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod utils;

// Core types
pub use config::{PipelineConfig, ScanConfig, StitchConfig};
pub use error::{Error, Result};
pub use models::{
    EncounterId, IcuSegment, IcuStayInterval, IntubationTimepoint, LocationEvent,
    VentilatorObservation,
};

// Algorithms
pub use algorithm::{
    assign_icu_groups, find_intubation_times, scan_batches, segment_batches, stitch_batches,
    stitch_icu_stays,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// I/O
pub use async_io::{read_parquet_async, read_table_async};
pub use utils::io::write_parquet;
