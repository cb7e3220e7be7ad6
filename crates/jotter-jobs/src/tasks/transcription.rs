//! Speech-to-text for audio clips without a transcript.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use jotter_core::{EnrichableAudio, Error, Result, TaskFamily};
use jotter_inference::MediaKind;

use super::{EnrichmentTask, PassContext};
use crate::report::FamilyReport;

/// Transcribes pending audio clips.
pub struct TranscriptionTask;

impl TranscriptionTask {
    async fn process(&self, ctx: &PassContext, clip: &EnrichableAudio) -> Result<()> {
        let transcript = ctx
            .read_media(
                MediaKind::Audio,
                &clip.object_name,
                &clip.mime_type,
                |model, bytes, mime| async move { model.transcribe_audio(&bytes, &mime).await },
            )
            .await?;

        if transcript.is_empty() {
            debug!(audio_id = %clip.id, "No speech found in clip");
            return Ok(());
        }
        if ctx.dry_run {
            info!(audio_id = %clip.id, response_len = transcript.len(), dry_run = true, "Would store transcript");
            return Ok(());
        }
        ctx.guarded(ctx.repo.set_audio_transcribed_text(clip.id, &transcript))
            .await
    }
}

#[async_trait]
impl EnrichmentTask for TranscriptionTask {
    fn family(&self) -> TaskFamily {
        TaskFamily::Transcription
    }

    #[instrument(skip(self, ctx), fields(subsystem = "jobs", component = "transcription", op = "run", dry_run = ctx.dry_run))]
    async fn run(&self, ctx: &PassContext) -> FamilyReport {
        let mut report = FamilyReport::new(TaskFamily::Transcription);

        let clips = match ctx.guarded(ctx.repo.list_audio_missing_transcript()).await {
            Ok(clips) => clips,
            Err(Error::Cancelled) => {
                report.cancelled = true;
                return report;
            }
            Err(e) => {
                warn!(error = %e, "Failed to list audio clips");
                report.record_listing_failure();
                return report;
            }
        };

        for clip in clips.iter().filter(|c| c.is_candidate()) {
            if ctx.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.process(ctx, clip).await {
                Ok(()) => report.record_success(),
                Err(Error::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!(audio_id = %clip.id, note_id = %clip.note_id, mime_type = %clip.mime_type, error = %e, "Transcription failed");
                    report.record_failure();
                }
            }
        }

        debug!(
            processed = report.processed,
            errors = report.errors,
            cancelled = report.cancelled,
            "Transcription finished"
        );
        report
    }
}
