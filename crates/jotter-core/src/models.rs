//! Entity views consumed by the enrichment pipeline.
//!
//! The pipeline never owns these rows. The persistence layer hands out
//! read-only views of pending items and accepts the enrichment results back.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::MAX_TAGS_PER_NOTE;

// =============================================================================
// TASK FAMILIES
// =============================================================================

/// The three enrichment task families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFamily {
    /// Tag generation for notes.
    Tags,
    /// Text extraction from images.
    Ocr,
    /// Speech-to-text for audio clips.
    Transcription,
}

impl TaskFamily {
    /// Every family, in the order the orchestrator launches them.
    pub const ALL: [TaskFamily; 3] = [TaskFamily::Tags, TaskFamily::Ocr, TaskFamily::Transcription];

    /// Stable lowercase name used in logs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFamily::Tags => "tags",
            TaskFamily::Ocr => "ocr",
            TaskFamily::Transcription => "transcription",
        }
    }
}

impl std::fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tags" | "tag" | "tagging" => Ok(TaskFamily::Tags),
            "ocr" | "images" | "image" => Ok(TaskFamily::Ocr),
            "transcription" | "transcribe" | "audio" => Ok(TaskFamily::Transcription),
            other => Err(format!(
                "unknown task family '{}' (expected tags, ocr or transcription)",
                other
            )),
        }
    }
}

// =============================================================================
// NOTES AND TAGS
// =============================================================================

/// Number of new tags a note with `current` tags may still receive.
pub fn remaining_tag_slots(current: usize) -> usize {
    MAX_TAGS_PER_NOTE.saturating_sub(current)
}

/// A note that may receive generated tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichableNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    /// Attached tag names in attachment order, case as stored.
    pub tags: Vec<String>,
}

impl EnrichableNote {
    /// How many tags this pass may add.
    pub fn remaining_tag_slots(&self) -> usize {
        remaining_tag_slots(self.tags.len())
    }

    /// A note is a tagging candidate while it is below the tag cap.
    pub fn is_tag_candidate(&self) -> bool {
        self.remaining_tag_slots() > 0
    }

    /// Case-insensitive membership check against the attached tags.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// The set of tag names a user has created before.
///
/// Names keep their original case for display and prompt hints; lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCatalog {
    names: Vec<String>,
    lowered: HashSet<String>,
}

impl TagCatalog {
    /// Build a catalog, dropping case-insensitive duplicates (first wins).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for name in names {
            let name = name.into();
            if catalog.lowered.insert(name.to_lowercase()) {
                catalog.names.push(name);
            }
        }
        catalog
    }

    /// Add a name unless a case-insensitive match is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.lowered.insert(name.to_lowercase()) {
            self.names.push(name);
            true
        } else {
            false
        }
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, name: &str) -> bool {
        self.lowered.contains(&name.to_lowercase())
    }

    /// Names in catalog order, original case.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Lowercased names for comparison.
    pub fn lowered(&self) -> &HashSet<String> {
        &self.lowered
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// =============================================================================
// MEDIA
// =============================================================================

fn is_blank(text: &Option<String>) -> bool {
    text.as_deref().map_or(true, |t| t.trim().is_empty())
}

/// An image attached to a note that may receive extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichableImage {
    pub id: Uuid,
    pub note_id: Uuid,
    /// Blob object holding the raw image bytes.
    pub object_name: String,
    /// Declared MIME type as stored at upload.
    pub mime_type: String,
    pub extracted_text: Option<String>,
}

impl EnrichableImage {
    /// An image is an OCR candidate while it has no extracted text.
    pub fn is_candidate(&self) -> bool {
        is_blank(&self.extracted_text)
    }
}

/// An audio clip attached to a note that may receive a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichableAudio {
    pub id: Uuid,
    pub note_id: Uuid,
    /// Blob object holding the raw audio bytes.
    pub object_name: String,
    /// Declared MIME type as stored at upload.
    pub mime_type: String,
    pub transcribed_text: Option<String>,
}

impl EnrichableAudio {
    /// Audio is a transcription candidate while it has no transcript.
    pub fn is_candidate(&self) -> bool {
        is_blank(&self.transcribed_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with_tags(tags: &[&str]) -> EnrichableNote {
        EnrichableNote {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "Had a great run today".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_task_family_roundtrip() {
        for family in TaskFamily::ALL {
            let parsed: TaskFamily = family.to_string().parse().unwrap();
            assert_eq!(parsed, family);
        }
    }

    #[test]
    fn test_task_family_aliases() {
        assert_eq!("Audio".parse::<TaskFamily>().unwrap(), TaskFamily::Transcription);
        assert_eq!(" images ".parse::<TaskFamily>().unwrap(), TaskFamily::Ocr);
        assert!("video".parse::<TaskFamily>().is_err());
    }

    #[test]
    fn test_task_family_serde() {
        let json = serde_json::to_string(&TaskFamily::Transcription).unwrap();
        assert_eq!(json, "\"transcription\"");
    }

    #[test]
    fn test_remaining_tag_slots() {
        assert_eq!(remaining_tag_slots(0), 3);
        assert_eq!(remaining_tag_slots(2), 1);
        assert_eq!(remaining_tag_slots(3), 0);
        assert_eq!(remaining_tag_slots(7), 0);
    }

    #[test]
    fn test_note_candidate_below_cap() {
        assert!(note_with_tags(&[]).is_tag_candidate());
        assert!(note_with_tags(&["a", "b"]).is_tag_candidate());
        assert!(!note_with_tags(&["a", "b", "c"]).is_tag_candidate());
    }

    #[test]
    fn test_note_has_tag_ignores_case() {
        let note = note_with_tags(&["Fitness"]);
        assert!(note.has_tag("fitness"));
        assert!(note.has_tag("FITNESS"));
        assert!(!note.has_tag("outdoors"));
    }

    #[test]
    fn test_catalog_case_insensitive() {
        let catalog = TagCatalog::new(["Fitness", "outdoors", "fitness"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), &["Fitness".to_string(), "outdoors".to_string()]);
        assert!(catalog.contains("FITNESS"));
        assert!(catalog.lowered().contains("fitness"));
        assert!(!catalog.contains("work"));
    }

    #[test]
    fn test_catalog_insert() {
        let mut catalog = TagCatalog::new(["Work"]);
        assert!(!catalog.insert("work"));
        assert!(catalog.insert("running"));
        assert_eq!(catalog.names(), &["Work".to_string(), "running".to_string()]);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = TagCatalog::new(Vec::<String>::new());
        assert!(catalog.is_empty());
        assert!(!catalog.contains(""));
    }

    #[test]
    fn test_image_candidate() {
        let mut image = EnrichableImage {
            id: Uuid::new_v4(),
            note_id: Uuid::new_v4(),
            object_name: "images/a.png".to_string(),
            mime_type: "image/png".to_string(),
            extracted_text: None,
        };
        assert!(image.is_candidate());
        image.extracted_text = Some("   ".to_string());
        assert!(image.is_candidate());
        image.extracted_text = Some("MENU".to_string());
        assert!(!image.is_candidate());
    }

    #[test]
    fn test_audio_candidate() {
        let mut audio = EnrichableAudio {
            id: Uuid::new_v4(),
            note_id: Uuid::new_v4(),
            object_name: "audio/a.ogg".to_string(),
            mime_type: "audio/ogg".to_string(),
            transcribed_text: Some(String::new()),
        };
        assert!(audio.is_candidate());
        audio.transcribed_text = Some("hello".to_string());
        assert!(!audio.is_candidate());
    }
}
