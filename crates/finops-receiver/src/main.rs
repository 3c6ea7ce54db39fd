//! FinOps Receiver - local webhook test double
//!
//! Accepts any JSON POST at `/webhook` and acknowledges it.
//!
//! Binary: finops-receiver

use clap::Parser;
use finops_receiver::{serve, ReceiverState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// FinOps Receiver - webhook test double
#[derive(Parser)]
#[command(name = "finops-receiver")]
#[command(about = "Local webhook receiver for the FinOps input generator", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Answer 503 to the first N events (exercises sender retries)
    #[arg(long, default_value_t = 0)]
    fail_first: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finops_receiver=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);
    let state = Arc::new(ReceiverState::new(cli.fail_first));

    serve(&addr, state.clone(), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    info!("👋 Receiver stopped after {} events", state.received());
    Ok(())
}
