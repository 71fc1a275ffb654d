use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use promptforge_ai::AiError;
use promptforge_contracts::ErrorBody;

/// Request-scoped failures surfaced before any response bytes exist.
///
/// Mid-stream failures never reach this type; once the chunked body is
/// open they can only abort it.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Prompt exceeds maximum length of {max} characters")]
    PromptTooLong { max: usize },

    #[error("API key not configured")]
    ApiKeyMissing,

    #[error("Failed to generate prompt")]
    Upstream(#[source] AiError),
}

impl GenerateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingPrompt | Self::PromptTooLong { .. } => StatusCode::BAD_REQUEST,
            Self::ApiKeyMissing | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
