//! Text extraction for images without extracted text.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use jotter_core::{EnrichableImage, Error, Result, TaskFamily};
use jotter_inference::MediaKind;

use super::{EnrichmentTask, PassContext};
use crate::report::FamilyReport;

/// Runs OCR over pending images.
pub struct OcrTask;

impl OcrTask {
    async fn process(&self, ctx: &PassContext, image: &EnrichableImage) -> Result<()> {
        let text = ctx
            .read_media(
                MediaKind::Image,
                &image.object_name,
                &image.mime_type,
                |model, bytes, mime| async move { model.extract_text(&bytes, &mime).await },
            )
            .await?;

        if text.is_empty() {
            debug!(image_id = %image.id, "No text found in image");
            return Ok(());
        }
        if ctx.dry_run {
            info!(image_id = %image.id, response_len = text.len(), dry_run = true, "Would store extracted text");
            return Ok(());
        }
        ctx.guarded(ctx.repo.set_image_extracted_text(image.id, &text))
            .await
    }
}

#[async_trait]
impl EnrichmentTask for OcrTask {
    fn family(&self) -> TaskFamily {
        TaskFamily::Ocr
    }

    #[instrument(skip(self, ctx), fields(subsystem = "jobs", component = "ocr", op = "run", dry_run = ctx.dry_run))]
    async fn run(&self, ctx: &PassContext) -> FamilyReport {
        let mut report = FamilyReport::new(TaskFamily::Ocr);

        let images = match ctx.guarded(ctx.repo.list_images_missing_text()).await {
            Ok(images) => images,
            Err(Error::Cancelled) => {
                report.cancelled = true;
                return report;
            }
            Err(e) => {
                warn!(error = %e, "Failed to list images");
                report.record_listing_failure();
                return report;
            }
        };

        for image in images.iter().filter(|i| i.is_candidate()) {
            if ctx.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.process(ctx, image).await {
                Ok(()) => report.record_success(),
                Err(Error::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!(image_id = %image.id, note_id = %image.note_id, mime_type = %image.mime_type, error = %e, "Text extraction failed");
                    report.record_failure();
                }
            }
        }

        debug!(
            processed = report.processed,
            errors = report.errors,
            cancelled = report.cancelled,
            "OCR finished"
        );
        report
    }
}
