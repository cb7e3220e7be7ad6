//! In-memory collaborators for pipeline tests.
//!
//! `InMemoryRepository` records every write and can be told to fail
//! specific listings or writes. `InMemoryBlobStore` serves fixed payloads.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use jotter_core::{
    BlobStore, ContentPart, EnrichableAudio, EnrichableImage, EnrichableNote,
    EnrichmentRepository, Error, GenerateRequest, GenerateResponse, Result, TaskFamily,
};
use jotter_inference::{MockGenerativeBackend, ModelClient};
use jotter_jobs::{Orchestrator, RunConfig};

#[derive(Default)]
struct State {
    users: Vec<Uuid>,
    catalogs: HashMap<Uuid, Vec<String>>,
    notes: Vec<EnrichableNote>,
    images: Vec<EnrichableImage>,
    audio: Vec<EnrichableAudio>,

    tag_writes: Vec<(Uuid, Uuid, Vec<String>)>,
    image_writes: Vec<(Uuid, String)>,
    audio_writes: Vec<(Uuid, String)>,

    failing_listings: HashSet<TaskFamily>,
    failing_catalogs: HashSet<Uuid>,
    failing_writes: HashSet<Uuid>,
    image_listings: usize,
}

/// Repository backed by vectors.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add_user(&self, catalog: &[&str]) -> Uuid {
        let id = Uuid::now_v7();
        self.with_state(|s| {
            s.users.push(id);
            s.catalogs
                .insert(id, catalog.iter().map(|c| c.to_string()).collect());
        });
        id
    }

    pub fn add_note(&self, user_id: Uuid, content: &str, tags: &[&str]) -> Uuid {
        let id = Uuid::now_v7();
        self.with_state(|s| {
            s.notes.push(EnrichableNote {
                id,
                user_id,
                content: content.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
        });
        id
    }

    pub fn add_image(&self, object_name: &str, mime_type: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.with_state(|s| {
            s.images.push(EnrichableImage {
                id,
                note_id: Uuid::now_v7(),
                object_name: object_name.to_string(),
                mime_type: mime_type.to_string(),
                extracted_text: None,
            })
        });
        id
    }

    pub fn add_audio(&self, object_name: &str, mime_type: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.with_state(|s| {
            s.audio.push(EnrichableAudio {
                id,
                note_id: Uuid::now_v7(),
                object_name: object_name.to_string(),
                mime_type: mime_type.to_string(),
                transcribed_text: None,
            })
        });
        id
    }

    /// Make the candidate listing of `family` fail.
    pub fn fail_listing(&self, family: TaskFamily) {
        self.with_state(|s| {
            s.failing_listings.insert(family);
        });
    }

    /// Make the tag catalog listing of one user fail.
    pub fn fail_catalog(&self, user_id: Uuid) {
        self.with_state(|s| {
            s.failing_catalogs.insert(user_id);
        });
    }

    /// Make writes for this note, image or clip fail.
    pub fn fail_write(&self, id: Uuid) {
        self.with_state(|s| {
            s.failing_writes.insert(id);
        });
    }

    pub fn tag_writes(&self) -> Vec<(Uuid, Uuid, Vec<String>)> {
        self.with_state(|s| s.tag_writes.clone())
    }

    pub fn image_writes(&self) -> Vec<(Uuid, String)> {
        self.with_state(|s| s.image_writes.clone())
    }

    pub fn audio_writes(&self) -> Vec<(Uuid, String)> {
        self.with_state(|s| s.audio_writes.clone())
    }

    pub fn write_count(&self) -> usize {
        self.with_state(|s| s.tag_writes.len() + s.image_writes.len() + s.audio_writes.len())
    }

    pub fn image_listings(&self) -> usize {
        self.with_state(|s| s.image_listings)
    }

    pub fn note_tags(&self, note_id: Uuid) -> Vec<String> {
        self.with_state(|s| {
            s.notes
                .iter()
                .find(|n| n.id == note_id)
                .map(|n| n.tags.clone())
                .unwrap_or_default()
        })
    }

    fn check_listing(state: &State, family: TaskFamily) -> Result<()> {
        if state.failing_listings.contains(&family) {
            return Err(Error::Internal(format!("{} listing unavailable", family)));
        }
        Ok(())
    }

    fn check_write(state: &State, id: Uuid) -> Result<()> {
        if state.failing_writes.contains(&id) {
            return Err(Error::Internal(format!("write for {} rejected", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl EnrichmentRepository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<Uuid>> {
        self.with_state(|s| {
            Self::check_listing(s, TaskFamily::Tags)?;
            Ok(s.users.clone())
        })
    }

    async fn list_tag_catalog(&self, user_id: Uuid) -> Result<Vec<String>> {
        self.with_state(|s| {
            if s.failing_catalogs.contains(&user_id) {
                return Err(Error::Internal(format!("catalog for {} unavailable", user_id)));
            }
            Ok(s.catalogs.get(&user_id).cloned().unwrap_or_default())
        })
    }

    async fn list_notes_below_tag_count(
        &self,
        user_id: Uuid,
        cap: usize,
    ) -> Result<Vec<EnrichableNote>> {
        self.with_state(|s| {
            Ok(s.notes
                .iter()
                .filter(|n| n.user_id == user_id && n.tags.len() < cap)
                .cloned()
                .collect())
        })
    }

    async fn add_tags_to_note(&self, user_id: Uuid, note_id: Uuid, tags: &[String]) -> Result<()> {
        self.with_state(|s| {
            Self::check_write(s, note_id)?;
            let note = s
                .notes
                .iter_mut()
                .find(|n| n.id == note_id && n.user_id == user_id)
                .ok_or_else(|| Error::NotFound(format!("note {}", note_id)))?;
            note.tags.extend(tags.iter().cloned());
            s.tag_writes.push((user_id, note_id, tags.to_vec()));
            Ok(())
        })
    }

    async fn list_images_missing_text(&self) -> Result<Vec<EnrichableImage>> {
        self.with_state(|s| {
            s.image_listings += 1;
            Self::check_listing(s, TaskFamily::Ocr)?;
            Ok(s.images.iter().filter(|i| i.is_candidate()).cloned().collect())
        })
    }

    async fn set_image_extracted_text(&self, image_id: Uuid, text: &str) -> Result<()> {
        self.with_state(|s| {
            Self::check_write(s, image_id)?;
            let image = s
                .images
                .iter_mut()
                .find(|i| i.id == image_id)
                .ok_or_else(|| Error::NotFound(format!("image {}", image_id)))?;
            image.extracted_text = Some(text.to_string());
            s.image_writes.push((image_id, text.to_string()));
            Ok(())
        })
    }

    async fn list_audio_missing_transcript(&self) -> Result<Vec<EnrichableAudio>> {
        self.with_state(|s| {
            Self::check_listing(s, TaskFamily::Transcription)?;
            Ok(s.audio.iter().filter(|a| a.is_candidate()).cloned().collect())
        })
    }

    async fn set_audio_transcribed_text(&self, audio_id: Uuid, text: &str) -> Result<()> {
        self.with_state(|s| {
            Self::check_write(s, audio_id)?;
            let clip = s
                .audio
                .iter_mut()
                .find(|a| a.id == audio_id)
                .ok_or_else(|| Error::NotFound(format!("audio clip {}", audio_id)))?;
            clip.transcribed_text = Some(text.to_string());
            s.audio_writes.push((audio_id, text.to_string()));
            Ok(())
        })
    }
}

/// Blob store serving fixed payloads by object name.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, object_name: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(object_name.to_string(), data.to_vec());
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn fetch(&self, object_name: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(object_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("blob {}", object_name)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Inline payload of a request, if any.
pub fn inline_data(request: &GenerateRequest) -> Option<(&str, &[u8])> {
    request.parts.iter().find_map(|p| match p {
        ContentPart::InlineData { mime_type, data } => Some((mime_type.as_str(), data.as_slice())),
        ContentPart::Text(_) => None,
    })
}

/// Mock answering tag requests with `tags_json`, images with "image text"
/// and audio with "audio transcript".
pub fn scripted_model(tags_json: &'static str) -> MockGenerativeBackend {
    MockGenerativeBackend::with_responder(move |request, _| {
        let text = match inline_data(request) {
            None => tags_json,
            Some((mime, _)) if mime.starts_with("image/") => "image text",
            Some(_) => "audio transcript",
        };
        Ok(GenerateResponse::new(vec![text.to_string()]))
    })
}

/// Orchestrator over in-memory collaborators, no call spacing.
pub fn orchestrator(
    repo: &Arc<InMemoryRepository>,
    blobs: &Arc<InMemoryBlobStore>,
    model: &MockGenerativeBackend,
    config: RunConfig,
) -> Orchestrator {
    Orchestrator::new(
        repo.clone(),
        blobs.clone(),
        ModelClient::new(Arc::new(model.clone())),
        config,
    )
}

/// Config with limiting disabled and only `tasks` enabled.
pub fn config_for(tasks: &[TaskFamily]) -> RunConfig {
    RunConfig::default()
        .with_delay(std::time::Duration::ZERO)
        .with_tasks(tasks.to_vec())
}
