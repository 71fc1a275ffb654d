//! Wire types shared by the PromptForge server and its clients.

use serde::{Deserialize, Serialize};

/// Default upper bound on prompt length, in characters.
///
/// Bounds upstream cost and latency; not a protocol limit.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 10_000;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// JSON payload of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_round_trips() {
        let json = serde_json::to_string(&GenerateRequest::new("an agent that sorts mail"))
            .expect("serialize");
        assert_eq!(json, r#"{"prompt":"an agent that sorts mail"}"#);
    }

    #[test]
    fn error_body_matches_wire_shape() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Prompt is required"}"#)
            .expect("deserialize");
        assert_eq!(body.error, "Prompt is required");
    }
}
