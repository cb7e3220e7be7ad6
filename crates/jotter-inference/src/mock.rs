//! Mock generative backend for testing.
//!
//! Serves scripted responses and records every request so tests can assert
//! on call counts, prompts and inline media without a network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use jotter_core::{ContentPart, Error, GenerateRequest, GenerateResponse, GenerativeBackend, Result};

type Responder = dyn Fn(&GenerateRequest, usize) -> Result<GenerateResponse> + Send + Sync;

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Concatenated text parts.
    pub prompt: String,
    /// MIME type of the first inline part, if any.
    pub mime_type: Option<String>,
    /// Inline payload of the first inline part, if any.
    pub data: Option<Vec<u8>>,
    pub temperature: Option<f32>,
    pub json_response: bool,
}

/// Mock backend. Clones share the call log.
#[derive(Clone)]
pub struct MockGenerativeBackend {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    latency: Duration,
}

impl MockGenerativeBackend {
    /// Respond with `f(request, call_index)`.
    pub fn with_responder<F>(f: F) -> Self
    where
        F: Fn(&GenerateRequest, usize) -> Result<GenerateResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(f),
            calls: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
        }
    }

    /// Always answer with one text part.
    pub fn with_fixed_response(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_, _| Ok(GenerateResponse::new(vec![text.clone()])))
    }

    /// Always answer with exactly these parts (empty = no candidates).
    pub fn with_parts(parts: Vec<String>) -> Self {
        Self::with_responder(move |_, _| Ok(GenerateResponse::new(parts.clone())))
    }

    /// Always fail with `Error::Model(message)`.
    pub fn with_error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_responder(move |_, _| Err(Error::Model(message.clone())))
    }

    /// Answer call `i` with `script[i]`; the last entry repeats.
    /// `Err(msg)` entries become `Error::Model(msg)`.
    pub fn with_script(script: Vec<std::result::Result<String, String>>) -> Self {
        Self::with_responder(move |_, idx| {
            let entry = script
                .get(idx)
                .or_else(|| script.last())
                .cloned()
                .unwrap_or_else(|| Ok(String::new()));
            entry
                .map(|text| GenerateResponse::new(vec![text]))
                .map_err(Error::Model)
        })
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All requests received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn record(&self, request: &GenerateRequest) -> usize {
        let inline = request.parts.iter().find_map(|p| match p {
            ContentPart::InlineData { mime_type, data } => Some((mime_type.clone(), data.clone())),
            ContentPart::Text(_) => None,
        });
        let call = MockCall {
            prompt: request.prompt_text(),
            mime_type: inline.as_ref().map(|(m, _)| m.clone()),
            data: inline.map(|(_, d)| d),
            temperature: request.temperature,
            json_response: request.json_response,
        };
        match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(call);
                calls.len() - 1
            }
            Err(_) => 0,
        }
    }
}

impl Default for MockGenerativeBackend {
    fn default() -> Self {
        Self::with_fixed_response("[]")
    }
}

#[async_trait]
impl GenerativeBackend for MockGenerativeBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let idx = self.record(&request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(&request, idx)
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
