//! Domain models for ventilator and ADT event extraction
//!
//! These are the typed rows the algorithms operate on. The `adapters` module
//! converts them from and to Arrow record batches.

pub mod encounter;
pub mod location;
pub mod ventilator;

// Re-export commonly used types
pub use encounter::EncounterId;
pub use location::{ICU_LOCATION_CATEGORIES, IcuSegment, IcuStayInterval, LocationEvent};
pub use ventilator::{IMV_DEVICE_CATEGORY, IntubationTimepoint, VentilatorObservation};
