//! Per-tick occurrence probability
//!
//! A tick lasts `tick_real` wall-clock seconds, i.e. `tick_real * scale_factor`
//! simulated seconds. With `rate` jobs per simulated hour the expected number
//! of arrivals during one tick is:
//!
//! ```text
//! p = rate * simulated_tick_secs / 3600
//! ```
//!
//! `p` is used as a Bernoulli probability, so it is clamped to [0, 1]: a
//! saturated tick always triggers, and never triggers more than one job.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Ephemeral per-tick values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickContext {
    /// Real duration of one tick
    pub tick_real: Duration,

    /// Simulated seconds covered by one tick
    pub simulated_tick_secs: f64,

    /// Demand rate at this tick (jobs per simulated hour)
    pub rate_per_hour: f64,

    /// Expected arrivals during this tick, before clamping
    pub raw_probability: f64,
}

impl TickContext {
    /// Compute the tick context for a given rate
    pub fn new(tick_real: Duration, scale_factor: f64, rate_per_hour: f64) -> Self {
        let simulated_tick_secs = tick_real.as_secs_f64() * scale_factor;
        let raw_probability = rate_per_hour * simulated_tick_secs / SECONDS_PER_HOUR;

        Self {
            tick_real,
            simulated_tick_secs,
            rate_per_hour,
            raw_probability,
        }
    }

    /// Probability used for the Bernoulli draw, clamped to [0, 1]
    pub fn probability(&self) -> f64 {
        if self.raw_probability.is_nan() {
            return 0.0;
        }
        self.raw_probability.clamp(0.0, 1.0)
    }

    /// Whether the unclamped probability exceeded 1
    pub fn is_saturated(&self) -> bool {
        self.raw_probability > 1.0
    }

    /// Decide whether a uniform sample in [0, 1) triggers a job
    pub fn should_trigger(&self, sample: f64) -> bool {
        sample < self.probability()
    }
}
