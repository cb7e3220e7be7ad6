//! MIME handling for media sent to the model provider.
//!
//! Declared types come from upload metadata and are not trusted to be
//! well formed. They are normalized, checked against a per-media
//! allow-list, and sniffed from magic bytes when missing or generic.

use jotter_core::{Error, Result};

/// Media family a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }

    /// Allow-listed types paired with the name sent to the provider.
    fn allow_list(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            MediaKind::Image => IMAGE_MIME_TYPES,
            MediaKind::Audio => AUDIO_MIME_TYPES,
        }
    }
}

/// Image types accepted for text extraction: (accepted, canonical).
pub const IMAGE_MIME_TYPES: &[(&str, &str)] = &[
    ("image/png", "image/png"),
    ("image/jpeg", "image/jpeg"),
    ("image/jpg", "image/jpeg"),
    ("image/pjpeg", "image/jpeg"),
    ("image/webp", "image/webp"),
    ("image/heic", "image/heic"),
    ("image/heif", "image/heif"),
];

/// Audio types accepted for transcription: (accepted, canonical).
pub const AUDIO_MIME_TYPES: &[(&str, &str)] = &[
    ("audio/wav", "audio/wav"),
    ("audio/x-wav", "audio/wav"),
    ("audio/wave", "audio/wav"),
    ("audio/mp3", "audio/mp3"),
    ("audio/mpeg", "audio/mp3"),
    ("audio/aiff", "audio/aiff"),
    ("audio/x-aiff", "audio/aiff"),
    ("audio/aac", "audio/aac"),
    ("audio/ogg", "audio/ogg"),
    ("audio/flac", "audio/flac"),
    ("audio/x-flac", "audio/flac"),
    ("audio/webm", "audio/webm"),
    ("audio/mp4", "audio/mp4"),
    ("audio/m4a", "audio/mp4"),
    ("audio/x-m4a", "audio/mp4"),
];

/// Lowercase, trim, and drop parameters (`audio/ogg; codecs=opus` -> `audio/ogg`).
pub fn normalize_mime(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_generic(mime: &str) -> bool {
    mime.is_empty() || mime == "application/octet-stream" || mime == "binary/octet-stream"
}

/// Resolve the provider MIME type for a payload, or reject it.
///
/// Missing or generic declared types fall back to magic-byte detection.
/// Returns `UnsupportedMimeType` when the result is not on the allow-list
/// for `kind`.
pub fn resolve_mime_type(kind: MediaKind, declared: &str, data: &[u8]) -> Result<&'static str> {
    let mut mime = normalize_mime(declared);
    if is_generic(&mime) {
        if let Some(detected) = infer::get(data) {
            mime = detected.mime_type().to_string();
        }
    }

    kind.allow_list()
        .iter()
        .find(|(accepted, _)| *accepted == mime)
        .map(|(_, canonical)| *canonical)
        .ok_or_else(|| {
            let shown = if mime.is_empty() { "<none>" } else { mime.as_str() };
            Error::UnsupportedMimeType(format!("{} for {}", shown, kind.as_str()))
        })
}
