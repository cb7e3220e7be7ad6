//! Runs enrichment passes.
//!
//! A pass launches every configured task family on its own tokio task,
//! sharing one rate limiter and one cancellation token, and combines the
//! three family reports into a `PassSummary` once each finishes.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use jotter_core::{BlobStore, EnrichmentRepository};
use jotter_inference::ModelClient;

use crate::config::RunConfig;
use crate::rate_limit::RateLimiter;
use crate::report::{FamilyReport, PassSummary};
use crate::sanitize::{ContentSanitizer, PatternSanitizer};
use crate::tasks::{tasks_for, EnrichmentTask, PassContext};

/// Drives passes over all configured task families.
pub struct Orchestrator {
    repo: Arc<dyn EnrichmentRepository>,
    blobs: Arc<dyn BlobStore>,
    model: ModelClient,
    sanitizer: Arc<dyn ContentSanitizer>,
    tasks: Vec<Arc<dyn EnrichmentTask>>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(
        repo: Arc<dyn EnrichmentRepository>,
        blobs: Arc<dyn BlobStore>,
        model: ModelClient,
        config: RunConfig,
    ) -> Self {
        Self {
            repo,
            blobs,
            model,
            sanitizer: Arc::new(PatternSanitizer::new()),
            tasks: tasks_for(&config.tasks),
            config,
        }
    }

    /// Replace the default pattern sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn ContentSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one pass over every family and wait for all of them.
    ///
    /// A family that panics is logged and counted as one error; the pass
    /// itself never fails.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> PassSummary {
        let started = Instant::now();
        let summary = Arc::new(Mutex::new(PassSummary::new(Utc::now(), self.config.dry_run)));

        let ctx = Arc::new(PassContext {
            repo: self.repo.clone(),
            blobs: self.blobs.clone(),
            model: self.model.clone(),
            limiter: RateLimiter::new(self.config.delay),
            sanitizer: self.sanitizer.clone(),
            cancel: cancel.clone(),
            dry_run: self.config.dry_run,
        });

        info!(
            subsystem = "jobs",
            component = "orchestrator",
            op = "run_pass",
            families = ?self.config.tasks,
            dry_run = self.config.dry_run,
            delay_ms = self.config.delay.as_millis() as u64,
            model = self.model.model_name(),
            "Enrichment pass starting"
        );

        let handles: Vec<_> = self
            .tasks
            .iter()
            .map(|task| {
                let task = task.clone();
                let ctx = ctx.clone();
                let summary = summary.clone();
                let family = task.family();
                let handle = tokio::spawn(async move {
                    let report = task.run(&ctx).await;
                    summary.lock().await.record(report);
                });
                (family, handle)
            })
            .collect();

        let results = futures::future::join_all(
            handles
                .into_iter()
                .map(|(family, handle)| async move { (family, handle.await) }),
        )
        .await;

        for (family, result) in results {
            if let Err(e) = result {
                error!(task = %family, error = %e, "Task family aborted");
                let mut report = FamilyReport::new(family);
                report.record_listing_failure();
                report.cancelled = cancel.is_cancelled();
                summary.lock().await.record(report);
            }
        }

        let mut summary = summary.lock().await.clone();
        summary.duration = started.elapsed();
        summary.cancelled |= cancel.is_cancelled();

        info!(
            subsystem = "jobs",
            component = "orchestrator",
            op = "run_pass",
            duration_ms = summary.duration.as_millis() as u64,
            tags_processed = summary.tags.processed,
            tags_errors = summary.tags.errors,
            tags_added = summary.tags.tags_added,
            images_processed = summary.images.processed,
            images_errors = summary.images.errors,
            audio_processed = summary.audio.processed,
            audio_errors = summary.audio.errors,
            cancelled = summary.cancelled,
            dry_run = summary.dry_run,
            "Enrichment pass finished"
        );
        summary
    }

    /// Run once, or keep running every `interval` until cancelled.
    ///
    /// Returns the last pass summary. When cancellation interrupts a pass,
    /// that pass's partial summary (marked cancelled) is returned.
    pub async fn run(&self, cancel: CancellationToken) -> PassSummary {
        let mut passes = 0u64;
        loop {
            let summary = self.run_pass(&cancel).await;
            passes += 1;

            if !self.config.is_continuous() || summary.cancelled || cancel.is_cancelled() {
                info!(passes, "Enrichment run stopping");
                return summary;
            }
            if summary.total_errors() > 0 {
                warn!(
                    errors = summary.total_errors(),
                    "Pass finished with errors, continuing"
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(passes, "Enrichment run cancelled between passes");
                    return summary;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}
