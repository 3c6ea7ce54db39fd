//! Demand model
//!
//! Expected job arrival rate (jobs per simulated hour) at a simulated instant.
//!
//! ```text
//! rate(t) = R0 * max(floor, diurnal(t) * weekend(t))
//!
//! diurnal(t) = sin((hour_fraction - 6) / 24 * 2π) + 1     ∈ [0, 2]
//!              trough at 00:00, peak at 12:00
//! weekend(t) = 0.5 on Saturday/Sunday, 1.0 otherwise
//! floor      = 0.1 (heartbeat: demand never reaches zero)
//! ```

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{CoreError, Result};

/// Default base rate R0 (jobs per simulated hour)
pub const DEFAULT_BASE_RATE: f64 = 10.0;

/// Weekend dampening factor
pub const WEEKEND_FACTOR: f64 = 0.5;

/// Minimum modifier applied to the base rate
pub const HEARTBEAT_FLOOR: f64 = 0.1;

/// Breakdown of one demand evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandSample {
    /// Expected jobs per simulated hour
    pub rate_per_hour: f64,

    /// Diurnal factor in [0, 2]
    pub diurnal_factor: f64,

    /// Weekend factor (1.0 on weekdays)
    pub weekend_factor: f64,

    /// Combined modifier after the heartbeat floor
    pub modifier: f64,
}

/// Diurnal/weekly demand curve
///
/// The weekend factor and heartbeat floor are fixed; only the base rate is
/// configurable, so `rate` always stays within
/// `[base_rate * HEARTBEAT_FLOOR, peak_rate]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemandModel {
    /// Base rate R0 (jobs per simulated hour)
    base_rate: f64,
}

impl Default for DemandModel {
    fn default() -> Self {
        Self {
            base_rate: DEFAULT_BASE_RATE,
        }
    }
}

impl DemandModel {
    /// Create a model with a custom base rate
    pub fn new(base_rate: f64) -> Result<Self> {
        if !base_rate.is_finite() || base_rate < 0.0 {
            return Err(CoreError::InvalidBaseRate(base_rate));
        }

        Ok(Self { base_rate })
    }

    /// Base rate R0
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Evaluate the model, keeping the intermediate factors
    pub fn sample(&self, at: &NaiveDateTime) -> DemandSample {
        let diurnal_factor = diurnal_factor(at);
        let weekend_factor = if is_weekend(at) { WEEKEND_FACTOR } else { 1.0 };
        let modifier = (diurnal_factor * weekend_factor).max(HEARTBEAT_FLOOR);

        DemandSample {
            rate_per_hour: self.base_rate * modifier,
            diurnal_factor,
            weekend_factor,
            modifier,
        }
    }

    /// Expected jobs per simulated hour at `at`
    pub fn rate(&self, at: &NaiveDateTime) -> f64 {
        self.sample(at).rate_per_hour
    }

    /// Highest rate the model can produce (weekday noon)
    pub fn peak_rate(&self) -> f64 {
        self.base_rate * 2.0
    }
}

/// Daily sinusoid in [0, 2]: 0 at midnight, 2 at noon
pub fn diurnal_factor(at: &NaiveDateTime) -> f64 {
    let hour = at.hour() as f64 + at.minute() as f64 / 60.0;
    ((hour - 6.0) / 24.0 * 2.0 * PI).sin() + 1.0
}

/// Saturday or Sunday
pub fn is_weekend(at: &NaiveDateTime) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_workload_rate_daily_peak() {
        // Jan 1 2026 is a Thursday
        let model = DemandModel::default();
        assert!(model.rate(&at(1, 12, 0)) > model.rate(&at(1, 0, 0)));
    }

    #[test]
    fn test_workload_rate_weekend_lull() {
        // Thursday vs Saturday, both at noon
        let model = DemandModel::default();
        assert!(model.rate(&at(1, 12, 0)) > model.rate(&at(3, 12, 0)));
        assert!(model.rate(&at(2, 15, 0)) > model.rate(&at(4, 15, 0)));
    }

    #[test]
    fn test_diurnal_extremes() {
        assert!((diurnal_factor(&at(1, 0, 0)) - 0.0).abs() < 1e-9);
        assert!((diurnal_factor(&at(1, 6, 0)) - 1.0).abs() < 1e-9);
        assert!((diurnal_factor(&at(1, 12, 0)) - 2.0).abs() < 1e-9);
        assert!((diurnal_factor(&at(1, 18, 0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_midnight_hits_heartbeat_floor() {
        let model = DemandModel::default();
        let sample = model.sample(&at(1, 0, 0));

        assert_eq!(sample.modifier, HEARTBEAT_FLOOR);
        assert!((sample.rate_per_hour - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekday_noon_is_peak() {
        let model = DemandModel::default();
        assert!((model.rate(&at(1, 12, 0)) - model.peak_rate()).abs() < 1e-9);
        assert!((model.rate(&at(3, 12, 0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_minutes_shift_the_curve() {
        let model = DemandModel::default();
        assert!(model.rate(&at(1, 9, 30)) > model.rate(&at(1, 9, 0)));
    }

    #[test]
    fn test_custom_base_rate() {
        let model = DemandModel::new(40.0).unwrap();
        assert_eq!(model.base_rate(), 40.0);
        assert!((model.rate(&at(1, 12, 0)) - 80.0).abs() < 1e-9);
        assert!(DemandModel::new(-1.0).is_err());
        assert!(DemandModel::new(f64::NAN).is_err());
    }

    #[test]
    fn test_rate_stays_within_floor_and_peak() {
        for base_rate in [0.0, 0.5, 10.0, 250.0] {
            let model = DemandModel::new(base_rate).unwrap();
            // One full week at 15 minute resolution
            for day in 5..=11 {
                for quarter in 0..96 {
                    let rate = model.rate(&at(day, quarter / 4, (quarter % 4) * 15));
                    assert!(rate >= base_rate * HEARTBEAT_FLOOR);
                    assert!(rate <= model.peak_rate() + 1e-9);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_rate_never_below_heartbeat(
            day in 1u32..=31,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let model = DemandModel::default();
            let t = at(day, hour, minute);

            prop_assert!(model.rate(&t) >= DEFAULT_BASE_RATE * HEARTBEAT_FLOOR);
            prop_assert_eq!(model.rate(&t), model.rate(&t));
        }
    }
}
