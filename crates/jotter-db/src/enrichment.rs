//! Enrichment repository implementation.
//!
//! Candidate selection and result writes for the three task families.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    EnrichableAudio, EnrichableImage, EnrichableNote, EnrichmentRepository, Error, Result,
};

/// PostgreSQL implementation of EnrichmentRepository.
#[derive(Clone)]
pub struct PgEnrichmentRepository {
    pool: Pool<Postgres>,
}

impl PgEnrichmentRepository {
    /// Create a new PgEnrichmentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrichmentRepository for PgEnrichmentRepository {
    async fn list_users(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE deleted_at IS NULL ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(ids)
    }

    async fn list_tag_catalog(&self, user_id: Uuid) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM tags WHERE user_id = $1 ORDER BY created_at, name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(names)
    }

    async fn list_notes_below_tag_count(
        &self,
        user_id: Uuid,
        cap: usize,
    ) -> Result<Vec<EnrichableNote>> {
        let rows = sqlx::query(
            r#"
            SELECT
                n.id,
                n.user_id,
                n.content,
                COALESCE(
                    array_agg(t.name ORDER BY nt.created_at, t.name)
                        FILTER (WHERE t.id IS NOT NULL),
                    '{}'
                ) AS tags
            FROM notes n
            LEFT JOIN note_tags nt ON nt.note_id = n.id
            LEFT JOIN tags t ON t.id = nt.tag_id
            WHERE n.user_id = $1 AND n.deleted_at IS NULL
            GROUP BY n.id, n.user_id, n.content, n.created_at
            HAVING COUNT(t.id) < $2
            ORDER BY n.created_at, n.id
            "#,
        )
        .bind(user_id)
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let notes = rows
            .into_iter()
            .map(|row| EnrichableNote {
                id: row.get("id"),
                user_id: row.get("user_id"),
                content: row.get("content"),
                tags: row.get("tags"),
            })
            .collect();

        Ok(notes)
    }

    async fn add_tags_to_note(&self, user_id: Uuid, note_id: Uuid, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let touched = sqlx::query(
            "UPDATE notes SET updated_at = $1 WHERE id = $2 AND user_id = $3 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(note_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if touched.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "note {} for user {}",
                note_id, user_id
            )));
        }

        for name in tags {
            // Reuse the catalog entry regardless of case so the stored name wins.
            let existing: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM tags WHERE user_id = $1 AND lower(name) = lower($2)",
            )
            .bind(user_id)
            .bind(name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;

            let tag_id = match existing {
                Some(id) => id,
                None => {
                    let id = Uuid::now_v7();
                    sqlx::query(
                        "INSERT INTO tags (id, user_id, name, created_at) VALUES ($1, $2, $3, $4)",
                    )
                    .bind(id)
                    .bind(user_id)
                    .bind(name)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
                    id
                }
            };

            sqlx::query(
                "INSERT INTO note_tags (note_id, tag_id, created_at) VALUES ($1, $2, $3)
                 ON CONFLICT (note_id, tag_id) DO NOTHING",
            )
            .bind(note_id)
            .bind(tag_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        debug!(
            subsystem = "db",
            component = "enrichment",
            op = "add_tags_to_note",
            %note_id,
            tag_count = tags.len(),
            "Tags attached"
        );
        Ok(())
    }

    async fn list_images_missing_text(&self) -> Result<Vec<EnrichableImage>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.note_id, i.object_name, i.mime_type, i.extracted_text
            FROM images i
            JOIN notes n ON n.id = i.note_id AND n.deleted_at IS NULL
            WHERE i.extracted_text IS NULL OR i.extracted_text = ''
            ORDER BY i.created_at, i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| EnrichableImage {
                id: row.get("id"),
                note_id: row.get("note_id"),
                object_name: row.get("object_name"),
                mime_type: row.get("mime_type"),
                extracted_text: row.get("extracted_text"),
            })
            .collect())
    }

    async fn set_image_extracted_text(&self, image_id: Uuid, text: &str) -> Result<()> {
        let result = sqlx::query("UPDATE images SET extracted_text = $1 WHERE id = $2")
            .bind(text)
            .bind(image_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("image {}", image_id)));
        }
        Ok(())
    }

    async fn list_audio_missing_transcript(&self) -> Result<Vec<EnrichableAudio>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.note_id, a.object_name, a.mime_type, a.transcribed_text
            FROM audio_clips a
            JOIN notes n ON n.id = a.note_id AND n.deleted_at IS NULL
            WHERE a.transcribed_text IS NULL OR a.transcribed_text = ''
            ORDER BY a.created_at, a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| EnrichableAudio {
                id: row.get("id"),
                note_id: row.get("note_id"),
                object_name: row.get("object_name"),
                mime_type: row.get("mime_type"),
                transcribed_text: row.get("transcribed_text"),
            })
            .collect())
    }

    async fn set_audio_transcribed_text(&self, audio_id: Uuid, text: &str) -> Result<()> {
        let result = sqlx::query("UPDATE audio_clips SET transcribed_text = $1 WHERE id = $2")
            .bind(text)
            .bind(audio_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("audio clip {}", audio_id)));
        }
        Ok(())
    }
}
