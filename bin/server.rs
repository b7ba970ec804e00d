// TKHQ Audit - Web Server
// Upload a CSV, get the annotated CSV back

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tkhq_audit::server::{router, ServerOptions};
use tkhq_audit::AuditConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tkhq-server", version, about = "HTTP API for the TKHQ audit engine")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000", env = "TKHQ_BIND")]
    bind: String,

    /// JSON configuration file
    #[arg(long, env = "TKHQ_CONFIG")]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum upload size in megabytes
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_upload_mb: u64,
}

/// Megabytes to bytes, clamped to what the platform can address
fn body_limit_bytes(megabytes: u64) -> usize {
    usize::try_from(megabytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(1024 * 1024)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tkhq_audit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AuditConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AuditConfig::default(),
    };
    tracing::info!(?config, "configuration loaded");

    let options = ServerOptions {
        request_timeout: Duration::from_secs(cli.timeout_secs),
        body_limit: body_limit_bytes(cli.max_upload_mb),
    };
    let app = router(config, options);

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.bind))?;

    println!("🚀 Server running on http://{}", cli.bind);
    println!("   POST /api/analyze?audit_date=YYYY-MM-DD  (CSV body)");
    println!("   POST /api/summary?audit_date=YYYY-MM-DD  (CSV body)");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
