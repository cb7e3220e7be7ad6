//! # jotter-jobs
//!
//! Background AI-enrichment pipeline for jotter.
//!
//! This crate provides:
//! - Prompt-injection sanitizing for note text (`ContentSanitizer`)
//! - A process-wide rate limiter on model calls
//! - Tag selection that prefers a user's existing vocabulary
//! - Three task families: tagging, image OCR, audio transcription
//! - The `Orchestrator` that runs them concurrently, once or on an interval
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jotter_db::{blob_store_for_bucket, Database};
//! use jotter_inference::{GeminiBackend, ModelClient};
//! use jotter_jobs::{Orchestrator, RunConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let db = Database::connect("postgres://...").await?;
//! let blobs = blob_store_for_bucket("journal-media", None, None)?;
//! let model = ModelClient::new(Arc::new(GeminiBackend::from_env()?));
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(db.enrichment.clone()),
//!     blobs,
//!     model,
//!     RunConfig::default().with_dry_run(true),
//! );
//! let summary = orchestrator.run(CancellationToken::new()).await;
//! println!("processed {} items", summary.total_processed());
//! ```

pub mod config;
pub mod orchestrator;
pub mod rate_limit;
pub mod report;
pub mod sanitize;
pub mod tag_selection;
pub mod tasks;

// Re-export core types
pub use jotter_core::*;

pub use config::{parse_duration, EnvConfig, RunConfig};
pub use orchestrator::Orchestrator;
pub use rate_limit::RateLimiter;
pub use report::{FamilyReport, PassSummary};
pub use sanitize::{ContentSanitizer, PatternSanitizer};
pub use tag_selection::{is_valid_tag, select_tags};
pub use tasks::{EnrichmentTask, OcrTask, PassContext, TaggingTask, TranscriptionTask};
