//! Collaborator traits for the enrichment pipeline.
//!
//! The pipeline consumes persistence, blob storage and a model provider only
//! through these traits so every collaborator can be swapped for a fake.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{EnrichableAudio, EnrichableImage, EnrichableNote, Result};

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Persistence operations used by the enrichment task families.
#[async_trait]
pub trait EnrichmentRepository: Send + Sync {
    /// List every user whose notes may be tagged.
    async fn list_users(&self) -> Result<Vec<Uuid>>;

    /// List the names of every tag the user has created.
    async fn list_tag_catalog(&self, user_id: Uuid) -> Result<Vec<String>>;

    /// List the user's notes carrying fewer than `cap` tags.
    async fn list_notes_below_tag_count(
        &self,
        user_id: Uuid,
        cap: usize,
    ) -> Result<Vec<EnrichableNote>>;

    /// Attach tags to a note, creating catalog entries as needed.
    async fn add_tags_to_note(&self, user_id: Uuid, note_id: Uuid, tags: &[String]) -> Result<()>;

    /// List images with no extracted text.
    async fn list_images_missing_text(&self) -> Result<Vec<EnrichableImage>>;

    /// Store the extracted text for an image.
    async fn set_image_extracted_text(&self, image_id: Uuid, text: &str) -> Result<()>;

    /// List audio clips with no transcript.
    async fn list_audio_missing_transcript(&self) -> Result<Vec<EnrichableAudio>>;

    /// Store the transcript for an audio clip.
    async fn set_audio_transcribed_text(&self, audio_id: Uuid, text: &str) -> Result<()>;
}

// =============================================================================
// BLOB STORAGE
// =============================================================================

/// Read access to uploaded media payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the full object.
    async fn fetch(&self, object_name: &str) -> Result<Vec<u8>>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

// =============================================================================
// MODEL PROVIDER
// =============================================================================

/// One part of a multimodal generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Instruction or user text.
    Text(String),
    /// Raw binary payload (image, audio) with its MIME type.
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A single generation request to the model provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateRequest {
    pub parts: Vec<ContentPart>,
    /// Sampling temperature; `None` uses the provider default.
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON response body.
    pub json_response: bool,
}

impl GenerateRequest {
    /// Request with a single text part.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(prompt.into())],
            ..Default::default()
        }
    }

    /// Prepend an inline binary part.
    pub fn with_inline_data(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.insert(
            0,
            ContentPart::InlineData {
                mime_type: mime_type.into(),
                data,
            },
        );
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }

    /// Concatenated text parts (the instruction as the model sees it).
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text parts returned by the model provider's first candidate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateResponse {
    pub parts: Vec<String>,
}

impl GenerateResponse {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All text parts joined in order.
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

/// Backend for the external generative model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Issue one generation request.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
