//! ADT location segments and stitched ICU stay models

use chrono::NaiveDateTime;

use super::encounter::EncounterId;

/// Location categories that count as ICU-level care (compared case-insensitively)
pub const ICU_LOCATION_CATEGORIES: [&str; 2] = ["icu", "stepdown"];

/// One admission-discharge-transfer segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationEvent {
    /// Patient identifier
    pub patient_id: Option<String>,
    /// Encounter the segment belongs to
    pub encounter_block: EncounterId,
    /// Hospitalization identifier
    pub hospitalization_id: Option<String>,
    /// Start of the segment
    pub in_dttm: NaiveDateTime,
    /// End of the segment
    pub out_dttm: NaiveDateTime,
    /// Coarse location category, e.g. "icu", "ward", "stepdown"
    pub location_category: Option<String>,
    /// Finer-grained location label
    pub location_type: Option<String>,
}

impl LocationEvent {
    /// Create a segment for an encounter with the given category
    #[must_use]
    pub fn new(
        encounter_block: impl Into<EncounterId>,
        in_dttm: NaiveDateTime,
        out_dttm: NaiveDateTime,
        location_category: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: None,
            encounter_block: encounter_block.into(),
            hospitalization_id: None,
            in_dttm,
            out_dttm,
            location_category: Some(location_category.into()),
            location_type: None,
        }
    }

    /// Set the location type
    #[must_use]
    pub fn with_location_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = Some(location_type.into());
        self
    }

    /// Set the patient and hospitalization identifiers
    #[must_use]
    pub fn with_ids(
        mut self,
        patient_id: impl Into<String>,
        hospitalization_id: impl Into<String>,
    ) -> Self {
        self.patient_id = Some(patient_id.into());
        self.hospitalization_id = Some(hospitalization_id.into());
        self
    }

    /// Whether the segment is an ICU or stepdown location
    #[must_use]
    pub fn is_icu_level(&self) -> bool {
        self.location_category.as_deref().is_some_and(|category| {
            ICU_LOCATION_CATEGORIES
                .iter()
                .any(|icu| category.eq_ignore_ascii_case(icu))
        })
    }
}

/// A retained ICU segment annotated with its stitching decisions
#[derive(Debug, Clone, PartialEq)]
pub struct IcuSegment {
    /// The underlying ADT segment
    pub event: LocationEvent,
    /// Dense rank of the segment's `in_dttm` within its encounter
    pub initial_rank: u32,
    /// Hours from the end of the current group to the next segment's start
    pub out_to_next_hours: Option<f64>,
    /// Whether the next segment joins this segment's group
    pub linked: bool,
    /// Group the segment was assigned to (1-based within the encounter)
    pub icu_group: u32,
}

/// One logical ICU stay made of one or more stitched segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IcuStayInterval {
    /// Encounter the stay belongs to
    pub encounter_block: EncounterId,
    /// Group identifier within the encounter
    pub icu_group: u32,
    /// Dense 1-based rank of the stay within the encounter
    pub icu_rank: u32,
    /// Earliest start among member segments
    pub in_dttm: NaiveDateTime,
    /// Latest end among member segments
    pub out_dttm: NaiveDateTime,
    /// Location type of the member segment that ends last
    pub location_type: Option<String>,
}
