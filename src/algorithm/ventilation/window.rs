//! Symmetric sliding window over one encounter's observations
//!
//! Observations are sorted by time. Prefix counts of the four intubation signals
//! let each window be evaluated in constant time, and the window edges only move
//! forward, so one sweep is linear in the number of rows.

use std::ops::{Add, Sub};

use chrono::{Duration, NaiveDateTime};

use crate::models::VentilatorObservation;
use crate::utils::time::window_bounds;

/// Number of rows carrying each intubation signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    /// Rows with an IMV device category
    pub imv: usize,
    /// Rows with a documented ventilator mode
    pub mode: usize,
    /// Rows with a documented FiO2 setting
    pub fio2: usize,
    /// Rows with a documented PEEP setting
    pub peep: usize,
}

impl SignalCounts {
    /// Signals carried by a single observation
    #[must_use]
    pub fn of(observation: &VentilatorObservation) -> Self {
        Self {
            imv: usize::from(observation.is_imv()),
            mode: usize::from(observation.has_mode()),
            fio2: usize::from(observation.has_fio2()),
            peep: usize::from(observation.has_peep()),
        }
    }

    /// Whether every signal is present at least once
    #[must_use]
    pub const fn all_present(&self) -> bool {
        self.imv > 0 && self.mode > 0 && self.fio2 > 0 && self.peep > 0
    }
}

impl Add for SignalCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            imv: self.imv + rhs.imv,
            mode: self.mode + rhs.mode,
            fio2: self.fio2 + rhs.fio2,
            peep: self.peep + rhs.peep,
        }
    }
}

impl Sub for SignalCounts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            imv: self.imv - rhs.imv,
            mode: self.mode - rhs.mode,
            fio2: self.fio2 - rhs.fio2,
            peep: self.peep - rhs.peep,
        }
    }
}

/// Distinct timestamps whose closed window `[t - half_width, t + half_width]` holds all signals
///
/// `rows` must belong to one encounter and be sorted by `recorded_dttm`.
pub fn qualifying_times(
    rows: &[&VentilatorObservation],
    half_width: Duration,
) -> Vec<NaiveDateTime> {
    let half_width = half_width.max(Duration::zero());
    let mut prefix = Vec::with_capacity(rows.len() + 1);
    prefix.push(SignalCounts::default());
    for row in rows {
        let last = prefix.last().copied().unwrap_or_default();
        prefix.push(last + SignalCounts::of(row));
    }

    let mut qualifying = Vec::new();
    // Window is rows[lo..hi]
    let mut lo = 0;
    let mut hi = 0;
    let mut previous: Option<NaiveDateTime> = None;

    for row in rows {
        let t = row.recorded_dttm;
        if previous == Some(t) {
            continue;
        }
        previous = Some(t);

        let (lower, upper) = window_bounds(t, half_width);
        if let Some(lower) = lower {
            while lo < rows.len() && rows[lo].recorded_dttm < lower {
                lo += 1;
            }
        }
        while hi < rows.len() && upper.is_none_or(|upper| rows[hi].recorded_dttm <= upper) {
            hi += 1;
        }

        if (prefix[hi] - prefix[lo]).all_present() {
            qualifying.push(t);
        }
    }

    qualifying
}
