//! Core traits for FinOps
//!
//! The scheduler works through these interfaces ONLY - never concrete
//! generators or sleep implementations.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::time::Duration;

use crate::error::GenerationError;
use crate::types::Payload;

/// Produces a job-request payload for a simulated instant.
///
/// Implementations own any post-processing of their raw output.
/// Failures are not retried by the caller.
#[async_trait]
pub trait PayloadGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Generate the payload for `sim_time`
    async fn generate(&self, sim_time: NaiveDateTime) -> Result<Payload, GenerationError>;
}

/// Suspends the caller for a real-time duration.
///
/// Injected into retry loops so tests can skip the wait.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
