//! FinOps Core - Shared types and traits
//!
//! This crate defines the pure pieces of the input generator:
//! - [`SimulationClock`] (real elapsed time → accelerated simulated time)
//! - [`DemandModel`] (simulated time → expected jobs per simulated hour)
//! - [`TickContext`] (rate → per-tick occurrence probability)
//!
//! And the boundary abstractions the generator binary plugs into:
//! - [`PayloadGenerator`] trait (interface for job-request producers)
//! - [`Delay`] trait (injectable sleep used for retry backoff)
//! - [`Payload`] and [`JobRequest`] types
//!
//! Nothing in here performs I/O.

pub mod clock;
pub mod demand;
pub mod error;
pub mod tick;
pub mod traits;
pub mod types;

pub use clock::SimulationClock;
pub use demand::{DemandModel, DemandSample, DEFAULT_BASE_RATE, HEARTBEAT_FLOOR, WEEKEND_FACTOR};
pub use error::{CoreError, GenerationError, Result};
pub use tick::TickContext;
pub use traits::{Delay, PayloadGenerator};
pub use types::{JobRequest, JobResources, Payload};
