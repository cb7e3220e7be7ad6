//! Per-family and per-pass result counters.

use std::time::Duration;

use chrono::{DateTime, Utc};

use jotter_core::TaskFamily;

/// What one task family did during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: TaskFamily,
    /// Items attempted, including the ones that failed.
    pub processed: usize,
    pub errors: usize,
    /// Tags attached (tag family only).
    pub tags_added: usize,
    /// The family stopped early because the run was cancelled.
    pub cancelled: bool,
}

impl FamilyReport {
    pub fn new(family: TaskFamily) -> Self {
        Self {
            family,
            processed: 0,
            errors: 0,
            tags_added: 0,
            cancelled: false,
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }

    /// A failure that happened before any item was reached.
    pub fn record_listing_failure(&mut self) {
        self.errors += 1;
    }
}

/// Aggregate of one enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub dry_run: bool,
    pub tags: FamilyReport,
    pub images: FamilyReport,
    pub audio: FamilyReport,
    pub cancelled: bool,
}

impl PassSummary {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            dry_run,
            tags: FamilyReport::new(TaskFamily::Tags),
            images: FamilyReport::new(TaskFamily::Ocr),
            audio: FamilyReport::new(TaskFamily::Transcription),
            cancelled: false,
        }
    }

    /// Store a family's report in its slot.
    pub fn record(&mut self, report: FamilyReport) {
        self.cancelled |= report.cancelled;
        match report.family {
            TaskFamily::Tags => self.tags = report,
            TaskFamily::Ocr => self.images = report,
            TaskFamily::Transcription => self.audio = report,
        }
    }

    pub fn family(&self, family: TaskFamily) -> &FamilyReport {
        match family {
            TaskFamily::Tags => &self.tags,
            TaskFamily::Ocr => &self.images,
            TaskFamily::Transcription => &self.audio,
        }
    }

    pub fn total_processed(&self) -> usize {
        self.tags.processed + self.images.processed + self.audio.processed
    }

    pub fn total_errors(&self) -> usize {
        self.tags.errors + self.images.errors + self.audio.errors
    }
}
