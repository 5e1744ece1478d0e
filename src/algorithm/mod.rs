//! Temporal aggregation algorithms
//!
//! - [`ventilation`]: sliding-window detection of intubation timepoints
//! - [`icu`]: stitching of ICU and stepdown segments into ranked stays
//!
//! Both are pure transformations over in-memory tables, parallelised across
//! encounters.

pub mod icu;
pub mod ventilation;

pub use icu::{assign_icu_groups, segment_batches, stitch_batches, stitch_icu_stays};
pub use ventilation::{find_intubation_times, scan_batches};
