//! Generator configuration
//!
//! Built once at startup (from CLI flags / environment) and passed by value
//! into the clock, scheduler and delivery components.

use crate::error::{GeneratorError, Result};
use chrono::NaiveDateTime;
use finops_core::clock::{default_sim_start, DEFAULT_SCALE_FACTOR};
use finops_core::DEFAULT_BASE_RATE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default webhook target (local receiver)
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:8080/webhook";

/// Default real seconds between ticks
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 1.0;

/// Default number of delivery attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff base (seconds)
pub const DEFAULT_BACKOFF_BASE_SECS: f64 = 1.0;

/// Default per-request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 5.0;

/// Which payload generator to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// LLM-written requests via the Gemini API
    Gemini,
    /// Offline randomized requests
    Synthetic,
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorKind::Gemini => write!(f, "gemini"),
            GeneratorKind::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Webhook URL that receives generated events
    pub webhook_url: String,

    /// Simulated seconds per real second
    pub scale_factor: f64,

    /// Real time between ticks
    pub tick_interval: Duration,

    /// Delivery attempts per event
    pub max_retries: u32,

    /// Backoff base; attempt n waits `base * 2^(n-1)` before retrying
    pub backoff_base: Duration,

    /// Timeout for a single POST
    pub request_timeout: Duration,

    /// First instant of the simulated timeline
    pub sim_start: NaiveDateTime,

    /// Demand base rate R0 (jobs per simulated hour)
    pub base_rate: f64,

    /// Payload generator
    pub generator: GeneratorKind,

    /// Gemini model name
    pub gemini_model: String,

    /// Gemini API key (never serialized)
    #[serde(skip)]
    pub gemini_api_key: Option<String>,

    /// RNG seed for the tick draws and synthetic payloads
    pub seed: Option<u64>,

    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            scale_factor: DEFAULT_SCALE_FACTOR,
            tick_interval: Duration::from_secs_f64(DEFAULT_TICK_INTERVAL_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs_f64(DEFAULT_BACKOFF_BASE_SECS),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS),
            sim_start: default_sim_start(),
            base_rate: DEFAULT_BASE_RATE,
            generator: GeneratorKind::Gemini,
            gemini_model: crate::gemini::DEFAULT_MODEL.to_string(),
            gemini_api_key: None,
            seed: None,
            max_ticks: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a config targeting `webhook_url`
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            ..Default::default()
        }
    }

    /// Set scale factor
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set retry policy
    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set simulated start
    pub fn with_sim_start(mut self, sim_start: NaiveDateTime) -> Self {
        self.sim_start = sim_start;
        self
    }

    /// Set demand base rate
    pub fn with_base_rate(mut self, base_rate: f64) -> Self {
        self.base_rate = base_rate;
        self
    }

    /// Set generator kind
    pub fn with_generator(mut self, generator: GeneratorKind) -> Self {
        self.generator = generator;
        self
    }

    /// Set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Check every field; any failure is fatal at startup
    pub fn validate(&self) -> Result<()> {
        if self.webhook_url.trim().is_empty() {
            return Err(GeneratorError::config("webhook URL is required"));
        }
        let url = reqwest::Url::parse(&self.webhook_url).map_err(|e| {
            GeneratorError::config(format!("invalid webhook URL {}: {}", self.webhook_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GeneratorError::config(format!(
                "webhook URL must be http(s), got {}",
                url.scheme()
            )));
        }

        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(GeneratorError::config(format!(
                "scale factor must be > 0, got {}",
                self.scale_factor
            )));
        }

        if self.tick_interval.is_zero() {
            return Err(GeneratorError::config("tick interval must be > 0"));
        }

        if self.max_retries == 0 {
            return Err(GeneratorError::config("max retries must be at least 1"));
        }

        if self.request_timeout.is_zero() {
            return Err(GeneratorError::config("request timeout must be > 0"));
        }

        if !self.base_rate.is_finite() || self.base_rate < 0.0 {
            return Err(GeneratorError::config(format!(
                "base rate must be >= 0, got {}",
                self.base_rate
            )));
        }

        if self.gemini_model.trim().is_empty() {
            return Err(GeneratorError::config("gemini model name is empty"));
        }

        Ok(())
    }

    /// Simulated duration of one tick, in seconds
    pub fn simulated_tick_secs(&self) -> f64 {
        self.tick_interval.as_secs_f64() * self.scale_factor
    }
}

/// Convert a user-supplied seconds value into a `Duration`
///
/// Rejects negative, NaN and infinite values.
pub fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| GeneratorError::config(format!("{} must be a non-negative number of seconds, got {}", name, secs)))
}

/// Parse a simulated start instant (`2026-01-01T00:00:00` or `2026-01-01 00:00:00`)
pub fn parse_sim_start(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| GeneratorError::config(format!("invalid simulated start {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.webhook_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.scale_factor, 720.0);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.sim_start.to_string(), "2026-01-01 00:00:00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = GeneratorConfig::new("https://consumer.example.com/events")
            .with_scale_factor(60.0)
            .with_tick_interval(Duration::from_millis(500))
            .with_retries(5, Duration::from_millis(250))
            .with_generator(GeneratorKind::Synthetic)
            .with_seed(7)
            .with_max_ticks(100);

        assert_eq!(config.scale_factor, 60.0);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.generator, GeneratorKind::Synthetic);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_ticks, Some(100));
        assert!((config.simulated_tick_secs() - 30.0).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(GeneratorConfig::new("").validate().is_err());
        assert!(GeneratorConfig::new("not a url").validate().is_err());
        assert!(GeneratorConfig::new("ftp://host/webhook").validate().is_err());
        assert!(GeneratorConfig::default().with_scale_factor(0.0).validate().is_err());
        assert!(GeneratorConfig::default().with_scale_factor(-720.0).validate().is_err());
        assert!(GeneratorConfig::default()
            .with_tick_interval(Duration::ZERO)
            .validate()
            .is_err());
        assert!(GeneratorConfig::default()
            .with_retries(0, Duration::from_secs(1))
            .validate()
            .is_err());
        assert!(GeneratorConfig::default().with_base_rate(-1.0).validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = GeneratorConfig::default();
        config.gemini_api_key = Some("secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"generator\":\"gemini\""));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_sim_start("2026-03-14T09:30:00").unwrap().to_string(),
            "2026-03-14 09:30:00"
        );
        assert!(parse_sim_start("2026-03-14 09:30:00").is_ok());
        assert!(parse_sim_start("yesterday").is_err());

        assert_eq!(secs_to_duration("tick", 0.25).unwrap(), Duration::from_millis(250));
        assert!(secs_to_duration("tick", -1.0).is_err());
        assert!(secs_to_duration("tick", f64::NAN).is_err());
    }
}
