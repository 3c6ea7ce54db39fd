//! # FinOps Input Generator
//!
//! Synthesizes a stream of compute-job requests following a diurnal/weekly
//! demand curve and delivers each as a JSON event to a webhook.
//!
//! ## Architecture
//!
//! ```text
//! TickScheduler ──▶ SimulationClock ──▶ DemandModel      (pure, finops-core)
//!      │
//!      ├──▶ PayloadGenerator (Gemini | Synthetic)        (may fail: skip tick)
//!      │
//!      └──▶ WebhookClient ── POST + backoff ──▶ consumer (bool outcome)
//! ```
//!
//! Every failure inside a tick degrades to "skip this tick"; only startup
//! configuration errors are fatal.

#![warn(clippy::all)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod gemini;
pub mod scheduler;
pub mod synthetic;

// Configuration
pub use config::{GeneratorConfig, GeneratorKind};

// Delivery
pub use delivery::{
    DeliveryAttempt, DeliveryOutcome, DeliveryReport, NetworkErrorKind, RetryPolicy, TokioDelay,
    WebhookClient, SUCCESS_STATUSES,
};

// Error handling
pub use error::{GeneratorError, Result};

// Payload generators
pub use gemini::GeminiGenerator;
pub use synthetic::SyntheticGenerator;

// Scheduling
pub use scheduler::{RunSummary, SchedulerState, TickOutcome, TickScheduler};
