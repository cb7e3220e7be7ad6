//! # jotter-inference
//!
//! Generative model access for the jotter enrichment pipeline.
//!
//! This crate provides:
//! - `GeminiBackend`, a `GenerativeBackend` over the Gemini REST API
//! - `ModelClient`, the enrichment adapter (tag generation, image text
//!   extraction, audio transcription) with prompt templates, MIME
//!   allow-lists and response normalization
//! - `MockGenerativeBackend` for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jotter_inference::{GeminiBackend, ModelClient};
//!
//! #[tokio::main]
//! async fn main() -> jotter_core::Result<()> {
//!     let backend = GeminiBackend::from_env()?;
//!     let client = ModelClient::new(Arc::new(backend));
//!     let tags = client.generate_tags("Had a great run today", &[]).await?;
//!     println!("{:?}", tags);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod gemini;
pub mod mime;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use jotter_core::*;

pub use client::{build_tag_prompt, check_payload, parse_tag_response, ModelClient};
pub use gemini::GeminiBackend;
pub use mime::{resolve_mime_type, MediaKind};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockGenerativeBackend};
