//! Gemini LLM provider

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, FinishReason, LlmClient, Role, StreamChunk, StreamResult,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct GeminiStreamResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let system = {
        let parts: Vec<GeminiPart> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| GeminiPart {
                text: m.content.clone(),
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(GeminiContent { role: None, parts })
        }
    };

    let contents = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: m.content.clone(),
            }],
        })
        .collect();

    let generation_config = if request.max_tokens.is_none()
        && request.temperature.is_none()
        && request.top_p.is_none()
    {
        None
    } else {
        Some(GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        })
    };

    GeminiRequest {
        contents,
        system_instruction: system,
        generation_config,
    }
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}

/// Extract the chunks carried by one parsed stream event.
///
/// Parts without a text payload (metadata-only frames) produce nothing.
fn chunks_from_response(response: GeminiStreamResponse) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();

    let Some(candidate) = response.candidates.into_iter().next() else {
        return chunks;
    };

    if let Some(content) = candidate.content {
        for part in content.parts {
            match part.text {
                Some(text) if !text.is_empty() => chunks.push(StreamChunk::text(text)),
                _ => {}
            }
        }
    }

    if let Some(reason) = candidate.finish_reason {
        chunks.push(StreamChunk::final_chunk(map_finish_reason(&reason)));
    }

    chunks
}

/// Find the end of the first complete SSE event (blank-line delimiter).
fn find_event_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Parse the data lines of one SSE event into chunks.
///
/// Unparseable data lines are skipped, not fatal.
fn chunks_from_event(event: &str) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();
    for line in event.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data.trim().is_empty() {
            continue;
        }
        let Ok(parsed) = serde_json::from_str::<GeminiStreamResponse>(data) else {
            continue;
        };
        chunks.extend(chunks_from_response(parsed));
    }
    chunks
}

// Truncate error bodies to keep logs bounded.
const MAX_ERROR_BODY: usize = 512;

fn truncate_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated]", &body[..cut])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<StreamResult> {
        let body = build_request(&request);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::debug!(model = %self.model, "opening Gemini completion stream");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(AiError::Llm(format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                truncate_error_body(&error)
            )));
        }

        let mut byte_stream = response.bytes_stream();

        Ok(Box::pin(async_stream::stream! {
            // Byte buffer: an SSE event split across reads is only
            // decoded once its blank-line delimiter has arrived.
            let mut buffer: Vec<u8> = Vec::new();

            loop {
                while let Some(pos) = find_event_boundary(&buffer) {
                    let event: Vec<u8> = buffer.drain(..pos + 2).collect();
                    let event = String::from_utf8_lossy(&event[..pos]).into_owned();
                    for chunk in chunks_from_event(&event) {
                        yield Ok(chunk);
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        yield Err(AiError::Llm(format!("Stream error: {}", e)));
                        return;
                    }
                    None => {
                        // A final event may end with the stream instead
                        // of a blank line; drain it rather than drop it.
                        if !buffer.is_empty() {
                            let event = String::from_utf8_lossy(&buffer).into_owned();
                            for chunk in chunks_from_event(&event) {
                                yield Ok(chunk);
                            }
                        }
                        return;
                    }
                }
            }
        }))
    }
}
