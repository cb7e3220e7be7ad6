//! The three enrichment task families.
//!
//! Every family runs the same loop over its candidates: check cancellation,
//! acquire a rate permit, call the model, persist unless dry-run, count.
//! A failing item is logged and counted; it never stops the family.

mod ocr;
mod tagging;
mod transcription;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use jotter_core::{BlobStore, EnrichmentRepository, Error, Result, TaskFamily};
use jotter_inference::{check_payload, MediaKind, ModelClient};

use crate::rate_limit::RateLimiter;
use crate::report::FamilyReport;
use crate::sanitize::ContentSanitizer;

pub use ocr::OcrTask;
pub use tagging::TaggingTask;
pub use transcription::TranscriptionTask;

/// Everything a family needs for one pass.
#[derive(Clone)]
pub struct PassContext {
    pub repo: Arc<dyn EnrichmentRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub model: ModelClient,
    pub limiter: RateLimiter,
    pub sanitizer: Arc<dyn ContentSanitizer>,
    pub cancel: CancellationToken,
    pub dry_run: bool,
}

impl PassContext {
    /// Run `fut` unless the pass is cancelled first.
    pub async fn guarded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    /// Fetch a media payload, validate it, wait for a permit and call `read`.
    ///
    /// Validation happens before the permit so a rejected item never costs
    /// a rate-limit slot.
    pub(crate) async fn read_media<'a, F, Fut>(
        &'a self,
        kind: MediaKind,
        object_name: &str,
        declared_mime: &str,
        read: F,
    ) -> Result<String>
    where
        F: FnOnce(&'a ModelClient, Vec<u8>, String) -> Fut,
        Fut: Future<Output = Result<String>> + 'a,
    {
        let bytes = self.guarded(self.blobs.fetch(object_name)).await?;
        let mime = check_payload(kind, &bytes, declared_mime)?;
        trace!(object_name, mime_type = mime, size = bytes.len(), "Payload accepted");

        self.limiter.acquire(&self.cancel).await?;
        self.guarded(read(&self.model, bytes, mime.to_string())).await
    }
}

/// One task family.
#[async_trait]
pub trait EnrichmentTask: Send + Sync {
    fn family(&self) -> TaskFamily;

    /// Process every current candidate. Never fails; failures are counted.
    async fn run(&self, ctx: &PassContext) -> FamilyReport;
}

/// Task implementations for the requested families, in launch order.
pub fn tasks_for(families: &[TaskFamily]) -> Vec<Arc<dyn EnrichmentTask>> {
    TaskFamily::ALL
        .iter()
        .filter(|f| families.contains(f))
        .map(|family| -> Arc<dyn EnrichmentTask> {
            match family {
                TaskFamily::Tags => Arc::new(TaggingTask),
                TaskFamily::Ocr => Arc::new(OcrTask),
                TaskFamily::Transcription => Arc::new(TranscriptionTask),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_for_keeps_launch_order() {
        let tasks = tasks_for(&[TaskFamily::Transcription, TaskFamily::Tags]);
        let families: Vec<TaskFamily> = tasks.iter().map(|t| t.family()).collect();
        assert_eq!(families, vec![TaskFamily::Tags, TaskFamily::Transcription]);
    }

    #[test]
    fn test_tasks_for_all() {
        assert_eq!(tasks_for(&TaskFamily::ALL).len(), 3);
        assert!(tasks_for(&[]).is_empty());
    }
}
