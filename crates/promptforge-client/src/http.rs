use bytes::Bytes;
use futures::Stream;

use promptforge_contracts::{ErrorBody, GenerateRequest};

use crate::error::{ClientError, GENERIC_ERROR};

/// Thin HTTP wrapper around the generation endpoint.
#[derive(Clone)]
pub struct PromptClient {
    http: reqwest::Client,
    base_url: String,
}

impl PromptClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST the prompt and return the raw response byte stream.
    ///
    /// Non-2xx responses never yield a stream; their JSON payload is
    /// parsed best-effort into a user-visible message.
    pub async fn open_stream(
        &self,
        prompt: &str,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>> + Send + use<>, ClientError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&GenerateRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| GENERIC_ERROR.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes_stream())
    }
}
