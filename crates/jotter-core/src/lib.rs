//! # jotter-core
//!
//! Core types, traits, and abstractions for the jotter enrichment pipeline.
//!
//! This crate provides the entity views the pipeline operates on, the
//! collaborator traits (persistence, blob storage, model provider) that the
//! other jotter crates implement or consume, and the shared error type.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
