//! Centralized default constants for the jotter enrichment pipeline.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// TAGGING
// =============================================================================

/// Maximum number of tags a note may carry through automatic enrichment.
pub const MAX_TAGS_PER_NOTE: usize = 3;

/// Maximum number of raw candidates kept from a single tag-generation response.
pub const MAX_TAG_CANDIDATES: usize = 3;

// =============================================================================
// SANITIZATION
// =============================================================================

/// Maximum characters of user content embedded in a model instruction.
pub const SANITIZE_MAX_CHARS: usize = 10_000;

/// Literal that replaces every matched prompt-injection phrase.
pub const FILTERED_MARKER: &str = "[filtered]";

/// Literal appended when user content is cut at [`SANITIZE_MAX_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default spacing between external model calls in seconds.
pub const CALL_DELAY_SECS: u64 = 2;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Gemini REST endpoint.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Default generation model.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Timeout for a single generation request in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Temperature for tag generation.
pub const TAG_TEMPERATURE: f32 = 0.2;

/// Temperature for OCR and transcription (deterministic extraction).
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

// =============================================================================
// STORAGE
// =============================================================================

/// Default Google Cloud Storage JSON API endpoint.
pub const BLOB_URL: &str = "https://storage.googleapis.com";

/// Timeout for a single blob download in seconds.
pub const BLOB_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable holding the model provider API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Environment variable overriding the generation model.
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

/// Environment variable overriding the model provider endpoint.
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";

/// Environment variable overriding the generation timeout.
pub const ENV_GEMINI_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";

/// Environment variable holding the blob bucket identifier.
pub const ENV_BLOB_BUCKET: &str = "BLOB_BUCKET";

/// Environment variable overriding the blob storage endpoint.
pub const ENV_BLOB_BASE_URL: &str = "BLOB_BASE_URL";

/// Environment variable holding an optional bearer token for the bucket.
pub const ENV_BLOB_ACCESS_TOKEN: &str = "BLOB_ACCESS_TOKEN";

/// Environment variable holding the PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable overriding the pool size.
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
