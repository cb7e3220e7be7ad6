//! Tag generation for notes below the tag cap.

use async_trait::async_trait;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use jotter_core::defaults::MAX_TAGS_PER_NOTE;
use jotter_core::{EnrichableNote, Error, Result, TagCatalog, TaskFamily};

use super::{EnrichmentTask, PassContext};
use crate::report::FamilyReport;
use crate::tag_selection::select_tags;

/// Suggests tags for every user's under-tagged notes.
pub struct TaggingTask;

impl TaggingTask {
    /// Tag one note. Returns the number of tags attached.
    async fn tag_note(
        &self,
        ctx: &PassContext,
        user_id: Uuid,
        note: &EnrichableNote,
        catalog: &mut TagCatalog,
    ) -> Result<usize> {
        let max_new = note.remaining_tag_slots();

        ctx.limiter.acquire(&ctx.cancel).await?;
        let text = ctx.sanitizer.sanitize(&note.content);
        let candidates = ctx
            .guarded(ctx.model.generate_tags(&text, catalog.names()))
            .await?;

        let selected = select_tags(&candidates, catalog.names(), &note.tags, max_new);
        if selected.is_empty() {
            debug!(note_id = %note.id, candidate_count = candidates.len(), "No usable tags suggested");
            return Ok(0);
        }

        if ctx.dry_run {
            info!(note_id = %note.id, tags = ?selected, dry_run = true, "Would add tags");
        } else {
            ctx.guarded(ctx.repo.add_tags_to_note(user_id, note.id, &selected))
                .await?;
            debug!(note_id = %note.id, tags = ?selected, "Tags added");
        }

        // Later notes in this pass should prefer what was just introduced.
        for tag in &selected {
            catalog.insert(tag.clone());
        }
        Ok(selected.len())
    }

    /// Tag all candidate notes of one user. Returns false when cancelled.
    ///
    /// A failed catalog or note listing counts one error for this user only.
    async fn run_user(&self, ctx: &PassContext, user_id: Uuid, report: &mut FamilyReport) -> bool {
        let listed = async {
            let names = ctx.guarded(ctx.repo.list_tag_catalog(user_id)).await?;
            let notes = ctx
                .guarded(ctx.repo.list_notes_below_tag_count(user_id, MAX_TAGS_PER_NOTE))
                .await?;
            Ok::<_, Error>((TagCatalog::new(names), notes))
        }
        .await;
        let (mut catalog, notes) = match listed {
            Ok(found) => found,
            Err(Error::Cancelled) => return false,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to list tagging candidates");
                report.record_listing_failure();
                return true;
            }
        };

        for note in &notes {
            if ctx.cancel.is_cancelled() {
                return false;
            }
            if note.remaining_tag_slots() == 0 {
                trace!(note_id = %note.id, "Note already at tag cap");
                continue;
            }
            if note.content.trim().is_empty() {
                trace!(note_id = %note.id, "Note has no content");
                continue;
            }

            match self.tag_note(ctx, user_id, note, &mut catalog).await {
                Ok(added) => {
                    report.record_success();
                    report.tags_added += added;
                }
                Err(Error::Cancelled) => return false,
                Err(e) => {
                    warn!(user_id = %user_id, note_id = %note.id, error = %e, "Tag generation failed");
                    report.record_failure();
                }
            }
        }
        true
    }
}

#[async_trait]
impl EnrichmentTask for TaggingTask {
    fn family(&self) -> TaskFamily {
        TaskFamily::Tags
    }

    #[instrument(skip(self, ctx), fields(subsystem = "jobs", component = "tagging", op = "run", dry_run = ctx.dry_run))]
    async fn run(&self, ctx: &PassContext) -> FamilyReport {
        let mut report = FamilyReport::new(TaskFamily::Tags);

        let users = match ctx.guarded(ctx.repo.list_users()).await {
            Ok(users) => users,
            Err(Error::Cancelled) => {
                report.cancelled = true;
                return report;
            }
            Err(e) => {
                warn!(error = %e, "Failed to list users");
                report.record_listing_failure();
                return report;
            }
        };

        for user_id in users {
            if ctx.cancel.is_cancelled() || !self.run_user(ctx, user_id, &mut report).await {
                report.cancelled = true;
                break;
            }
        }

        debug!(
            processed = report.processed,
            errors = report.errors,
            tags_added = report.tags_added,
            cancelled = report.cancelled,
            "Tagging finished"
        );
        report
    }
}
