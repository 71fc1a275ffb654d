use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, error};

use promptforge_ai::{MASTER_PROMPT_VERSION, build_completion_request};
use promptforge_contracts::GenerateRequest;

use crate::api::response::GenerateError;
use crate::api::state::AppState;

/// Validate the decoded request body.
///
/// Pure; performs no I/O. An invalid request must never open an
/// upstream connection.
fn validate(body: &Value, max_chars: usize) -> Result<GenerateRequest, GenerateError> {
    let prompt = body
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or(GenerateError::MissingPrompt)?;

    if prompt.trim().is_empty() {
        return Err(GenerateError::MissingPrompt);
    }

    if prompt.chars().count() > max_chars {
        return Err(GenerateError::PromptTooLong { max: max_chars });
    }

    Ok(GenerateRequest::new(prompt))
}

/// POST /api/generate
///
/// Relays the upstream token stream as a chunked `text/plain` body.
/// Each fragment is written as soon as it arrives; a mid-stream
/// upstream failure aborts the body, since headers are already out.
pub async fn generate_prompt(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        // An unparseable body carries no usable prompt.
        Err(_) => return GenerateError::MissingPrompt.into_response(),
    };

    let request = match validate(&body, state.config.max_prompt_chars) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    // Checked before any upstream work so the operator-actionable
    // error stays distinct from upstream failures.
    if state.config.gemini_api_key.is_none() {
        return GenerateError::ApiKeyMissing.into_response();
    }

    debug!(
        provider = state.llm.provider(),
        model = state.llm.model(),
        preamble_version = MASTER_PROMPT_VERSION,
        prompt_chars = request.prompt.chars().count(),
        "opening generation stream"
    );

    let completion = build_completion_request(&request.prompt);
    let stream = match state.llm.complete_stream(completion).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(error = %err, "upstream call failed before streaming");
            return GenerateError::Upstream(err).into_response();
        }
    };

    let body_stream = stream.filter_map(|item| async move {
        match item {
            // Metadata-only and terminal chunks write nothing.
            Ok(chunk) if chunk.text.is_empty() => None,
            Ok(chunk) => Some(Ok(Bytes::from(chunk.text))),
            Err(err) => {
                error!(error = %err, "streaming error, aborting response body");
                Some(Err(err))
            }
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body_stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAX: usize = 10_000;

    #[test]
    fn accepts_prompts_within_the_limit() {
        let body = json!({ "prompt": "an agent that sorts mail" });
        let request = validate(&body, MAX).expect("valid prompt");
        assert_eq!(request.prompt, "an agent that sorts mail");

        let body = json!({ "prompt": "a".repeat(MAX) });
        assert!(validate(&body, MAX).is_ok());
    }

    #[test]
    fn rejects_missing_or_non_string_prompt() {
        for body in [json!({}), json!({ "prompt": 42 }), json!({ "prompt": null })] {
            assert!(matches!(
                validate(&body, MAX),
                Err(GenerateError::MissingPrompt)
            ));
        }
    }

    #[test]
    fn rejects_whitespace_only_prompt() {
        let body = json!({ "prompt": "   \n\t " });
        assert!(matches!(
            validate(&body, MAX),
            Err(GenerateError::MissingPrompt)
        ));
    }

    #[test]
    fn rejects_prompt_one_char_over_the_limit() {
        let body = json!({ "prompt": "a".repeat(MAX + 1) });
        assert!(matches!(
            validate(&body, MAX),
            Err(GenerateError::PromptTooLong { max: MAX })
        ));
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        // Multi-byte characters count once each.
        let body = json!({ "prompt": "é".repeat(MAX) });
        assert!(validate(&body, MAX).is_ok());
    }
}
