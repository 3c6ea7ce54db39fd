//! Simulated clock
//!
//! Maps wall-clock elapsed time onto an accelerated simulated timeline:
//!
//! ```text
//! simulated_now = sim_start + (real_now - real_start) * scale_factor
//! ```
//!
//! A scale factor of 720 compresses 30 simulated days into one real hour
//! (1 real second = 12 simulated minutes).
//!
//! Simulated instants are naive local datetimes: the demand model only cares
//! about hour-of-day and weekday, not about time zones.

use crate::error::{CoreError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::time::Duration;

/// Default scale factor (30 simulated days per real hour)
pub const DEFAULT_SCALE_FACTOR: f64 = 720.0;

/// Default simulated start: 2026-01-01T00:00:00
pub fn default_sim_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Immutable real → simulated time mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    /// When the run started in real life
    real_start: DateTime<Utc>,

    /// Starting instant of the simulated world
    sim_start: NaiveDateTime,

    /// Simulated seconds per real second (always > 0)
    scale_factor: f64,
}

impl SimulationClock {
    /// Create a new clock
    ///
    /// Fails if `scale_factor` is not a finite positive number.
    pub fn new(
        real_start: DateTime<Utc>,
        sim_start: NaiveDateTime,
        scale_factor: f64,
    ) -> Result<Self> {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(CoreError::InvalidScaleFactor(scale_factor));
        }

        Ok(Self {
            real_start,
            sim_start,
            scale_factor,
        })
    }

    /// Simulated instant corresponding to `real_now`
    ///
    /// Saturates at the bounds of `NaiveDateTime` instead of overflowing.
    pub fn simulated_time(&self, real_now: DateTime<Utc>) -> NaiveDateTime {
        let elapsed = real_now - self.real_start;
        let elapsed_us = elapsed.num_microseconds().unwrap_or(if elapsed > TimeDelta::zero() {
            i64::MAX
        } else {
            i64::MIN
        });

        // float → int `as` casts saturate
        let sim_us = (elapsed_us as f64 * self.scale_factor) as i64;

        self.sim_start
            .checked_add_signed(TimeDelta::microseconds(sim_us))
            .unwrap_or(if sim_us >= 0 {
                NaiveDateTime::MAX
            } else {
                NaiveDateTime::MIN
            })
    }

    /// How much simulated time passes during `real` wall-clock time
    pub fn simulated_duration(&self, real: Duration) -> Duration {
        Duration::try_from_secs_f64(real.as_secs_f64() * self.scale_factor).unwrap_or(Duration::MAX)
    }

    /// Simulated start instant
    pub fn sim_start(&self) -> NaiveDateTime {
        self.sim_start
    }

    /// Scale factor
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
