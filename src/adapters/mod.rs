//! Adapters between Arrow record batches and the typed models

pub mod location;
pub mod ventilator;

pub use location::{
    icu_segments_to_batch, icu_stays_to_batch, location_events_from_batch,
    location_events_from_batches,
};
pub use ventilator::{
    intubation_times_to_batch, observations_from_batch, observations_from_batches,
};
