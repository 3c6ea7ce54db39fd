//! Offline payload generator
//!
//! Fills the job-request schema with randomized but plausible values, so the
//! pipeline can run without an LLM key. Deadlines are derived from the
//! simulated time: the job duration plus a priority-dependent slack.

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};
use finops_core::{GenerationError, JobRequest, JobResources, Payload, PayloadGenerator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const TIERS: [(&str, &str); 3] = [("Tier 1", "99.99%"), ("Tier 2", "99.9%"), ("Tier 3", "99.5%")];

/// Priority name and the slack (hours) granted on top of the job duration
const PRIORITIES: [(&str, i64); 4] = [("Critical", 4), ("High", 24), ("Normal", 72), ("Low", 168)];

const ACCELERATORS: [&str; 5] = ["A100", "H100", "L4", "TPU v4", "TPU v5e"];
const GPU_COUNTS: [u32; 5] = [1, 2, 4, 8, 16];
const REGIONS: [&str; 6] = ["us-east", "us-west", "eu-west", "eu-central", "ap-southeast", "global"];
const COMPLIANCE: [&str; 4] = ["None", "HIPAA", "GDPR", "SOC2"];
const QUALITY: [&str; 3] = ["standard", "high", "premium"];
const AVAILABILITY: [&str; 3] = ["low", "medium", "high"];
const WORKLOADS: [&str; 6] = [
    "fine-tune a 7B chat model on support transcripts",
    "run nightly batch inference over the product catalog",
    "pretrain a small vision encoder",
    "sweep hyperparameters for the ranking model",
    "evaluate the new retrieval stack against last quarter's benchmark",
    "distill the large summarizer into a mobile-sized model",
];

/// Randomized [`PayloadGenerator`]
pub struct SyntheticGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticGenerator {
    /// Seed from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence for a seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draw a typed job request for `sim_time`
    pub fn job_request(&self, sim_time: NaiveDateTime) -> JobRequest {
        // A poisoned lock still holds a usable RNG
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let (tier, sla) = pick(&mut *rng, &TIERS);
        let (priority, slack_hours) = pick(&mut *rng, &PRIORITIES);
        let gpus = pick(&mut *rng, &GPU_COUNTS);
        let accelerator = pick(&mut *rng, &ACCELERATORS);
        let workload = pick(&mut *rng, &WORKLOADS);
        let duration_hours: u32 = rng.gen_range(1..=720);
        let region = pick(&mut *rng, &REGIONS);

        let sla_deadline = sim_time
            .checked_add_signed(TimeDelta::hours(duration_hours as i64 + slack_hours))
            .unwrap_or(NaiveDateTime::MAX);

        JobRequest {
            tier: tier.to_string(),
            priority: priority.to_string(),
            resources: JobResources {
                gpus,
                kind: accelerator.to_string(),
                description: format!("{}x {} for {}h", gpus, accelerator, duration_hours),
            },
            duration_hours,
            sla_deadline,
            region: region.to_string(),
            compliance: pick(&mut *rng, &COMPLIANCE).to_string(),
            sla: sla.to_string(),
            min_quality: pick(&mut *rng, &QUALITY).to_string(),
            min_availability: pick(&mut *rng, &AVAILABILITY).to_string(),
            description: format!(
                "Hi infra team, we need {}x {} in {} to {}. Expect about {} hours of runtime; \
                 this is {} priority, so please have it done by {}.",
                gpus,
                accelerator,
                region,
                workload,
                duration_hours,
                priority.to_lowercase(),
                sla_deadline.format("%Y-%m-%d %H:%M"),
            ),
        }
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform draw from a fixed table; an empty table fails to compile
fn pick<T: Copy, const N: usize>(rng: &mut StdRng, items: &[T; N]) -> T {
    const { assert!(N > 0, "lookup tables must not be empty") };
    items[rng.gen_range(0..N)]
}

#[async_trait]
impl PayloadGenerator for SyntheticGenerator {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn generate(&self, sim_time: NaiveDateTime) -> Result<Payload, GenerationError> {
        Payload::from_job(&self.job_request(sim_time))
    }
}
