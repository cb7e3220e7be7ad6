//! Gemini generative backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use jotter_core::defaults::{
    ENV_GEMINI_API_KEY, ENV_GEMINI_BASE_URL, ENV_GEMINI_MODEL, ENV_GEMINI_TIMEOUT_SECS,
    GEMINI_MODEL, GEMINI_URL, GEN_TIMEOUT_SECS,
};
use jotter_core::{
    ContentPart, Error, GenerateRequest, GenerateResponse, GenerativeBackend, Result,
};

/// Generation slower than this is logged as slow.
const SLOW_GENERATION_MS: u64 = 30_000;

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiBackend {
    /// Create a backend against the public endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_config(GEMINI_URL.to_string(), api_key, model, GEN_TIMEOUT_SECS)
    }

    /// Create a backend with explicit endpoint and timeout.
    pub fn with_config(
        base_url: String,
        api_key: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config(format!("{} is empty", ENV_GEMINI_API_KEY)));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            timeout_secs,
        })
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GEMINI_API_KEY` | (required) | Provider credential |
    /// | `GEMINI_MODEL` | `gemini-2.0-flash` | Generation model |
    /// | `GEMINI_BASE_URL` | Google endpoint | API base URL |
    /// | `GEMINI_TIMEOUT_SECS` | `120` | Per-request timeout |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(ENV_GEMINI_API_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_GEMINI_API_KEY)))?;
        let model = std::env::var(ENV_GEMINI_MODEL)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| GEMINI_MODEL.to_string());
        let base_url =
            std::env::var(ENV_GEMINI_BASE_URL).unwrap_or_else(|_| GEMINI_URL.to_string());
        let timeout_secs = std::env::var(ENV_GEMINI_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEN_TIMEOUT_SECS);

        Self::with_config(base_url, api_key, model, timeout_secs)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

// ─── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiPart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiRequest {
    fn from_request(request: GenerateRequest) -> Self {
        let parts = request
            .parts
            .into_iter()
            .map(|part| match part {
                ContentPart::Text(text) => GeminiPart::Text(text),
                ContentPart::InlineData { mime_type, data } => GeminiPart::InlineData(InlineData {
                    mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                }),
            })
            .collect();

        let generation_config = if request.temperature.is_some() || request.json_response {
            Some(GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.json_response.then_some("application/json"),
            })
        } else {
            None
        };

        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts,
            }],
            generation_config,
        }
    }
}

impl GeminiResponse {
    /// Text parts of the first candidate; no candidate means no parts.
    fn into_parts(self) -> Vec<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    #[instrument(skip(self, request), fields(subsystem = "inference", component = "gemini", op = "generate", model = %self.model, part_count = request.parts.len()))]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let start = Instant::now();
        let body = GeminiRequest::from_request(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Model(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("Failed to parse response: {}", e)))?;

        let parts = result.into_parts();
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            part_count = parts.len(),
            response_len = parts.iter().map(String::len).sum::<usize>(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > SLOW_GENERATION_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow generation operation");
        }
        Ok(GenerateResponse::new(parts))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
