//! Ventilator observation and intubation timepoint models

use chrono::NaiveDateTime;

use super::encounter::EncounterId;

/// Device category marking invasive mechanical ventilation
pub const IMV_DEVICE_CATEGORY: &str = "IMV";

/// One recorded ventilator reading
///
/// Several observations may share a timestamp; each is a distinct fact.
#[derive(Debug, Clone, PartialEq)]
pub struct VentilatorObservation {
    /// Encounter the reading belongs to
    pub encounter_block: EncounterId,
    /// When the reading was recorded
    pub recorded_dttm: NaiveDateTime,
    /// Device category, e.g. "IMV"
    pub device_category: Option<String>,
    /// Ventilator mode category
    pub mode_category: Option<String>,
    /// Set fraction of inspired oxygen
    pub fio2_set: Option<f64>,
    /// Set positive end-expiratory pressure
    pub peep_set: Option<f64>,
}

impl VentilatorObservation {
    /// Create an observation without any recorded signals
    #[must_use]
    pub fn new(encounter_block: impl Into<EncounterId>, recorded_dttm: NaiveDateTime) -> Self {
        Self {
            encounter_block: encounter_block.into(),
            recorded_dttm,
            device_category: None,
            mode_category: None,
            fio2_set: None,
            peep_set: None,
        }
    }

    /// Set the device category
    #[must_use]
    pub fn with_device(mut self, device_category: impl Into<String>) -> Self {
        self.device_category = Some(device_category.into());
        self
    }

    /// Set the ventilator mode
    #[must_use]
    pub fn with_mode(mut self, mode_category: impl Into<String>) -> Self {
        self.mode_category = Some(mode_category.into());
        self
    }

    /// Set the FiO2 setting
    #[must_use]
    pub const fn with_fio2(mut self, fio2_set: f64) -> Self {
        self.fio2_set = Some(fio2_set);
        self
    }

    /// Set the PEEP setting
    #[must_use]
    pub const fn with_peep(mut self, peep_set: f64) -> Self {
        self.peep_set = Some(peep_set);
        self
    }

    /// Whether the device category is invasive mechanical ventilation
    #[must_use]
    pub fn is_imv(&self) -> bool {
        self.device_category.as_deref() == Some(IMV_DEVICE_CATEGORY)
    }

    /// Whether a ventilator mode is documented
    #[must_use]
    pub const fn has_mode(&self) -> bool {
        self.mode_category.is_some()
    }

    /// Whether an FiO2 setting is documented (NaN counts as missing)
    #[must_use]
    pub fn has_fio2(&self) -> bool {
        self.fio2_set.is_some_and(|v| !v.is_nan())
    }

    /// Whether a PEEP setting is documented (NaN counts as missing)
    #[must_use]
    pub fn has_peep(&self) -> bool {
        self.peep_set.is_some_and(|v| !v.is_nan())
    }
}

/// A timepoint at which all intubation criteria are documented nearby
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntubationTimepoint {
    /// Encounter the timepoint belongs to
    pub encounter_block: EncounterId,
    /// Qualifying observation timestamp
    pub recorded_dttm: NaiveDateTime,
}

impl IntubationTimepoint {
    /// Create a new timepoint
    #[must_use]
    pub fn new(encounter_block: impl Into<EncounterId>, recorded_dttm: NaiveDateTime) -> Self {
        Self {
            encounter_block: encounter_block.into(),
            recorded_dttm,
        }
    }
}
