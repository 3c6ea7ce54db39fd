//! FinOps Input Generator - synthetic compute-job traffic for a webhook consumer
//!
//! ## Usage
//!
//! ```bash
//! # Local loop: start the receiver, then generate offline payloads
//! finops-receiver --port 8080
//! finops-gen --generator synthetic
//!
//! # LLM-written requests, 30 simulated days per real hour
//! GEMINI_API_KEY=... finops-gen --webhook-url https://consumer.example.com/events
//!
//! # Short smoke run
//! finops-gen --generator synthetic --max-ticks 20 --seed 7
//! ```

use anyhow::Context;
use clap::Parser;
use finops_core::PayloadGenerator;
use finops_generator::{
    config::{self, GeneratorConfig, GeneratorKind},
    gemini::{self, GeminiGenerator},
    SyntheticGenerator, TickScheduler, WebhookClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// FinOps input generator: diurnal job-request traffic delivered to a webhook
#[derive(Parser)]
#[command(name = "finops-gen")]
#[command(about = "Synthesize compute-job requests and deliver them to a webhook", long_about = None)]
struct Cli {
    /// Webhook that receives generated events
    #[arg(long, env = "WEBHOOK_URL", default_value = config::DEFAULT_WEBHOOK_URL)]
    webhook_url: String,

    /// Simulated seconds per real second (720 = 30 days per hour)
    #[arg(long, env = "SCALE_FACTOR", default_value_t = finops_core::clock::DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Real seconds between ticks
    #[arg(long, env = "TICK_INTERVAL_SEC", default_value_t = config::DEFAULT_TICK_INTERVAL_SECS)]
    tick_interval: f64,

    /// Delivery attempts per event
    #[arg(long, env = "MAX_RETRIES", default_value_t = config::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Backoff base in seconds (doubles each retry)
    #[arg(long, env = "BACKOFF_BASE_SEC", default_value_t = config::DEFAULT_BACKOFF_BASE_SECS)]
    backoff_base: f64,

    /// Timeout for a single webhook POST (seconds)
    #[arg(long, env = "REQUEST_TIMEOUT_SEC", default_value_t = config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: f64,

    /// Simulated start instant (YYYY-MM-DDTHH:MM:SS)
    #[arg(long, env = "SIM_START", default_value = "2026-01-01T00:00:00")]
    sim_start: String,

    /// Demand base rate (jobs per simulated hour)
    #[arg(long, env = "BASE_RATE", default_value_t = finops_core::DEFAULT_BASE_RATE)]
    base_rate: f64,

    /// Payload generator
    #[arg(long, env = "GENERATOR", value_enum, default_value_t = GeneratorKind::Gemini)]
    generator: GeneratorKind,

    /// Gemini API key
    #[arg(long, env = gemini::API_KEY_ENV, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = gemini::DEFAULT_MODEL)]
    gemini_model: String,

    /// RNG seed for tick draws and synthetic payloads
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Also write logs to this file (rotated daily)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Build and validate the runtime configuration
    fn into_config(self) -> finops_generator::Result<GeneratorConfig> {
        let config = GeneratorConfig {
            webhook_url: self.webhook_url,
            scale_factor: self.scale_factor,
            tick_interval: config::secs_to_duration("tick interval", self.tick_interval)?,
            max_retries: self.max_retries,
            backoff_base: config::secs_to_duration("backoff base", self.backoff_base)?,
            request_timeout: config::secs_to_duration("request timeout", self.request_timeout)?,
            sim_start: config::parse_sim_start(&self.sim_start)?,
            base_rate: self.base_rate,
            generator: self.generator,
            gemini_model: self.gemini_model,
            gemini_api_key: self.gemini_api_key,
            seed: self.seed,
            max_ticks: self.max_ticks,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (stdout, plus an optional rolling file)
    let (file_layer, _file_guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .context("--log-file must name a file")?;
            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finops_gen=info,finops_generator=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    let config = cli.into_config().context("invalid configuration")?;

    info!("========================================");
    info!("FinOps Input Generator starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Target webhook: {}", config.webhook_url);
    info!(
        "Scale factor: {}x. Tick interval: {}s",
        config.scale_factor,
        config.tick_interval.as_secs_f64()
    );
    info!("Generator: {}", config.generator);
    info!("========================================");
    info!(config = %serde_json::to_string(&config)?, "Resolved configuration");

    let generator: Arc<dyn PayloadGenerator> = match config.generator {
        GeneratorKind::Gemini => {
            if config.gemini_api_key.is_none() {
                warn!(
                    "{} is not set. LLM generation will fail on every triggered tick.",
                    gemini::API_KEY_ENV
                );
            }
            Arc::new(GeminiGenerator::new(
                config.gemini_model.clone(),
                config.gemini_api_key.clone(),
            )?)
        }
        GeneratorKind::Synthetic => Arc::new(match config.seed {
            Some(seed) => SyntheticGenerator::seeded(seed),
            None => SyntheticGenerator::new(),
        }),
    };

    let webhook = WebhookClient::new(config.request_timeout)?;
    let scheduler = TickScheduler::new(&config, chrono::Utc::now(), generator, webhook)?;

    // Ctrl+C is latched by a task so a signal during a delivery is not lost
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Ctrl+C received, finishing current tick...");
        }
        let _ = shutdown_tx.send(());
    });

    let summary = scheduler
        .run(async {
            let _ = shutdown_rx.await;
        })
        .await;

    info!(
        "✅ FinOps Input Generator shutting down: {} ticks, {} triggered, {} delivered",
        summary.ticks, summary.triggered, summary.delivered
    );

    Ok(())
}
