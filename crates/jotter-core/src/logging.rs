//! Structured logging schema and field name constants for jotter.
//!
//! `tracing` macros take field names as identifiers, so call sites spell
//! them out; this module is the list they must agree with. The jobs crate
//! checks its task families against it in `tests/log_fields_test.rs`.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A task family or pass could not run, requires operator attention |
//! | WARN  | Per-item failure, item skipped and counted |
//! | INFO  | Lifecycle events (startup, shutdown), pass completions |
//! | DEBUG | Decision points (skips, dry-run would-writes, fallbacks) |
//! | TRACE | Per-item iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "db", "inference", "jobs", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "gemini", "pool", "orchestrator", "rate_limiter"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "generate", "fetch", "run_pass"
pub const OPERATION: &str = "op";

/// Task family name ("tags", "ocr", "transcription").
pub const TASK: &str = "task";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID whose notes are being tagged.
pub const USER_ID: &str = "user_id";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Image UUID being operated on.
pub const IMAGE_ID: &str = "image_id";

/// Audio clip UUID being operated on.
pub const AUDIO_ID: &str = "audio_id";

/// Blob object name.
pub const OBJECT_NAME: &str = "object_name";

/// Declared or sniffed MIME type.
pub const MIME_TYPE: &str = "mime_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates returned by a selection query.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of items processed in a pass.
pub const PROCESSED: &str = "processed";

/// Number of items that failed in a pass.
pub const ERRORS: &str = "errors";

/// Number of tags attached in a pass.
pub const TAGS_ADDED: &str = "tags_added";

/// Byte length of a prompt or payload.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether persistence writes are suppressed.
pub const DRY_RUN: &str = "dry_run";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
