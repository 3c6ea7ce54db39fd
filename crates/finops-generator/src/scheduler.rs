//! Tick scheduler
//!
//! Drives the whole generator from a single cooperative loop:
//!
//! ```text
//! RUNNING ──┬── real now ──▶ clock ──▶ sim now ──▶ demand ──▶ rate
//!           │                                                   │
//!           │          p = rate · tick_real · scale / 3600 ◀────┘
//!           │                          │
//!           │      sample < p ? ── yes ──▶ generate ──▶ deliver (retries)
//!           │                          │
//!           └──── sleep(tick) ◀────────┘
//!                    │
//!                 shutdown ──▶ STOPPED
//! ```
//!
//! Ticks never overlap: a triggered generation/delivery finishes before the
//! next sleep starts. Failures are logged and the loop moves on. Shutdown is
//! only observed between ticks, so an in-flight delivery always completes.

use crate::config::GeneratorConfig;
use crate::delivery::{RetryPolicy, WebhookClient};
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use finops_core::{DemandModel, PayloadGenerator, SimulationClock, TickContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Ticking
    Running,
    /// Terminal; reached via shutdown or the tick limit
    Stopped,
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Bernoulli draw did not trigger
    Idle,
    /// Payload generated and acknowledged
    Delivered,
    /// Payload generated, every delivery attempt failed
    DeliveryFailed,
    /// Generator failed; nothing was sent
    GenerationFailed(String),
}

/// Counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub triggered: u64,
    pub generation_failures: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Delivered => {
                self.triggered += 1;
                self.delivered += 1;
            }
            TickOutcome::DeliveryFailed => {
                self.triggered += 1;
                self.delivery_failures += 1;
            }
            TickOutcome::GenerationFailed(_) => {
                self.triggered += 1;
                self.generation_failures += 1;
            }
        }
    }
}

/// Fixed-cadence demand simulator
pub struct TickScheduler {
    clock: SimulationClock,
    demand: DemandModel,
    tick_interval: Duration,
    webhook_url: String,
    retry: RetryPolicy,
    generator: Arc<dyn PayloadGenerator>,
    webhook: WebhookClient,
    rng: StdRng,
    max_ticks: Option<u64>,
    state: SchedulerState,
    summary: RunSummary,
    saturation_warned: bool,
}

impl TickScheduler {
    /// Build a scheduler from a validated config
    ///
    /// The simulated clock maps `real_start` onto `config.sim_start`.
    pub fn new(
        config: &GeneratorConfig,
        real_start: DateTime<Utc>,
        generator: Arc<dyn PayloadGenerator>,
        webhook: WebhookClient,
    ) -> Result<Self> {
        config.validate()?;

        let clock = SimulationClock::new(real_start, config.sim_start, config.scale_factor)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            clock,
            demand: DemandModel::new(config.base_rate)?,
            tick_interval: config.tick_interval,
            webhook_url: config.webhook_url.clone(),
            retry: RetryPolicy::new(config.max_retries, config.backoff_base),
            generator,
            webhook,
            rng,
            max_ticks: config.max_ticks,
            state: SchedulerState::Running,
            summary: RunSummary::default(),
            saturation_warned: false,
        })
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Counters so far
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Tick context for a real instant, without drawing
    pub fn tick_context(&self, real_now: DateTime<Utc>) -> (NaiveDateTime, TickContext) {
        let sim_now = self.clock.simulated_time(real_now);
        let rate = self.demand.rate(&sim_now);
        let ctx = TickContext::new(self.tick_interval, self.clock.scale_factor(), rate);
        (sim_now, ctx)
    }

    /// Run a single tick as if the wall clock read `real_now`
    pub async fn tick_at(&mut self, real_now: DateTime<Utc>) -> TickOutcome {
        let (sim_now, ctx) = self.tick_context(real_now);

        if ctx.is_saturated() && !self.saturation_warned {
            warn!(
                raw_probability = ctx.raw_probability,
                rate_per_hour = ctx.rate_per_hour,
                "Tick probability exceeds 1; clamping (at most one job per tick)"
            );
            self.saturation_warned = true;
        }

        let sample: f64 = self.rng.r#gen();
        let outcome = if ctx.should_trigger(sample) {
            info!(
                sim_time = %sim_now.format("%Y-%m-%dT%H:%M:%S"),
                rate_per_hour = %format!("{:.2}", ctx.rate_per_hour),
                "Triggering generation"
            );
            self.trigger(sim_now).await
        } else {
            debug!(
                sim_time = %sim_now,
                probability = ctx.probability(),
                sample,
                "No job this tick"
            );
            TickOutcome::Idle
        };

        self.summary.record(&outcome);
        outcome
    }

    async fn trigger(&self, sim_now: NaiveDateTime) -> TickOutcome {
        let payload = match self.generator.generate(sim_now).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(generator = self.generator.name(), error = %e, "Error generating payload");
                return TickOutcome::GenerationFailed(e.to_string());
            }
        };

        debug!(
            payload = %serde_json::to_string_pretty(&payload).unwrap_or_default(),
            "Generated payload"
        );

        let report = self
            .webhook
            .deliver_with_report(&self.webhook_url, &payload, self.retry)
            .await;

        if report.delivered() {
            TickOutcome::Delivered
        } else {
            error!("Payload delivery failed. Moving on to the next scheduled interval.");
            TickOutcome::DeliveryFailed
        }
    }

    fn limit_reached(&self) -> bool {
        self.max_ticks
            .is_some_and(|limit| self.summary.ticks >= limit)
    }

    /// Tick until `shutdown` resolves or the tick limit is hit
    ///
    /// `shutdown` is only polled while sleeping between ticks.
    pub async fn run<F>(mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            tick_interval_secs = self.tick_interval.as_secs_f64(),
            scale_factor = self.clock.scale_factor(),
            sim_start = %self.clock.sim_start(),
            "Scheduler running"
        );

        while self.state == SchedulerState::Running {
            self.tick_at(Utc::now()).await;

            if self.limit_reached() {
                info!(ticks = self.summary.ticks, "Tick limit reached");
                self.state = SchedulerState::Stopped;
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    self.state = SchedulerState::Stopped;
                }
            }
        }

        info!(
            ticks = self.summary.ticks,
            triggered = self.summary.triggered,
            delivered = self.summary.delivered,
            delivery_failures = self.summary.delivery_failures,
            generation_failures = self.summary.generation_failures,
            "Scheduler stopped"
        );

        self.summary
    }
}
