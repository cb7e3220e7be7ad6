//! jotter-enrich: background AI enrichment for journal content.
//!
//! Attaches generated tags to notes, extracted text to images and
//! transcripts to audio clips. Runs one pass and exits, or keeps running
//! on an interval until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! # One pass, default 2s spacing between model calls
//! jotter-enrich
//!
//! # Every 10 minutes, only OCR and transcription, no writes
//! jotter-enrich --interval 10m --tasks ocr,transcription --dry-run
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jotter_db::{blob_store_for_bucket, Database, PoolConfig};
use jotter_inference::{GeminiBackend, ModelClient};
use jotter_jobs::{parse_duration, EnvConfig, Orchestrator, PassSummary, RunConfig, TaskFamily};

#[derive(Parser, Debug)]
#[command(name = "jotter-enrich")]
#[command(version, about = "Background AI enrichment for jotter", long_about = None)]
struct Cli {
    /// Time between passes (e.g. 30s, 10m). 0 runs once and exits.
    #[arg(long, value_parser = parse_duration, default_value = "0")]
    interval: Duration,

    /// Minimum spacing between model calls across all tasks. 0 disables limiting.
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    delay: Duration,

    /// Call the model and log results without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Task families to run.
    #[arg(long, value_delimiter = ',', default_value = "tags,ocr,transcription")]
    tasks: Vec<TaskFamily>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let mut tasks = self.tasks.clone();
        tasks.dedup();
        RunConfig::default()
            .with_interval(self.interval)
            .with_delay(self.delay)
            .with_dry_run(self.dry_run)
            .with_tasks(tasks)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    match run(cli).await {
        Ok(summary) => {
            info!(
                processed = summary.total_processed(),
                errors = summary.total_errors(),
                tags_added = summary.tags.tags_added,
                cancelled = summary.cancelled,
                "jotter-enrich finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "jotter-enrich failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<PassSummary> {
    let env = EnvConfig::from_env().context("invalid configuration")?;
    let config = cli.run_config();
    info!(
        interval_secs = config.interval.as_secs(),
        delay_ms = config.delay.as_millis() as u64,
        dry_run = config.dry_run,
        tasks = ?config.tasks,
        bucket = %env.blob_bucket,
        model = %env.gemini_model,
        "Starting jotter-enrich"
    );

    let db = Database::connect_with_config(&env.database_url, PoolConfig::from_env())
        .await
        .context("failed to connect to database")?;
    let backend = GeminiBackend::with_config(
        env.gemini_base_url.clone(),
        env.gemini_api_key.clone(),
        env.gemini_model.clone(),
        env.gemini_timeout_secs,
    )
    .context("failed to create model backend")?;
    let blobs = blob_store_for_bucket(
        &env.blob_bucket,
        env.blob_base_url.clone(),
        env.blob_access_token.clone(),
    )
    .context("failed to create blob store")?;

    let orchestrator = Orchestrator::new(
        Arc::new(db.enrichment.clone()),
        blobs,
        ModelClient::new(Arc::new(backend)),
        config,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let summary = orchestrator.run(cancel).await;
    db.close().await;
    Ok(summary)
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, finishing current item"),
        _ = terminate => info!("Received SIGTERM, finishing current item"),
    }
    token.cancel();
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "jotter_enrich=info,jotter_jobs=info,jotter_inference=info,jotter_db=info".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("jotter-enrich.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}
