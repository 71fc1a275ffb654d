//! Deterministic mock LLM client for server and client tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::time::{Duration, sleep};

use crate::error::{AiError, Result};
use crate::llm::client::{
    CompletionRequest, FinishReason, LlmClient, StreamChunk, StreamResult,
};

/// Deterministic step for scripted mock streams.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Yield a text chunk.
    Text(String),
    /// Fail the stream mid-flight.
    Error(String),
}

/// Scripted stream step with optional delay before it is yielded.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Scripted LLM client.
///
/// Every `complete_stream` call replays the same steps and bumps an
/// invocation counter, so tests can assert both ordering and whether
/// the upstream was contacted at all.
pub struct MockLlmClient {
    model: String,
    steps: Vec<MockStep>,
    open_error: Option<String>,
    invocations: Arc<AtomicUsize>,
}

impl MockLlmClient {
    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            steps,
            open_error: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Client whose stream never opens: `complete_stream` fails before
    /// yielding anything, like a provider rejecting the call outright.
    pub fn failing(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            steps: Vec::new(),
            open_error: Some(message.into()),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `complete_stream` has been called.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Shared counter handle, for asserting after the client moved.
    pub fn invocation_counter(&self) -> Arc<AtomicUsize> {
        self.invocations.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete_stream(&self, _request: CompletionRequest) -> Result<StreamResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.open_error {
            return Err(AiError::Llm(message.clone()));
        }

        let steps = self.steps.clone();

        Ok(Box::pin(async_stream::stream! {
            for step in steps {
                if step.delay_ms > 0 {
                    sleep(Duration::from_millis(step.delay_ms)).await;
                }
                match step.kind {
                    MockStepKind::Text(text) => yield Ok(StreamChunk::text(text)),
                    MockStepKind::Error(message) => {
                        yield Err(AiError::Llm(message));
                        return;
                    }
                }
            }
            yield Ok(StreamChunk::final_chunk(FinishReason::Stop));
        }))
    }
}

#[cfg(test)]
mod tests {
    use futures::{StreamExt, TryStreamExt};

    use super::*;
    use crate::llm::Message;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![Message::user("ping")])
    }

    #[tokio::test]
    async fn replays_scripted_chunks_in_order() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::text("Role: "), MockStep::text("Task: do X")],
        );

        let chunks: Vec<StreamChunk> = client
            .complete_stream(request())
            .await
            .expect("stream should open")
            .try_collect()
            .await
            .expect("stream should succeed");

        let text: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "Role: Task: do X");
        assert_eq!(
            chunks.last().and_then(|c| c.finish_reason.clone()),
            Some(FinishReason::Stop)
        );
        assert_eq!(client.invocations(), 1);
    }

    #[tokio::test]
    async fn failing_client_errors_before_yielding_anything() {
        let client = MockLlmClient::failing("mock-model", "bad gateway");

        let err = match client.complete_stream(request()).await {
            Ok(_) => panic!("stream must not open"),
            Err(err) => err,
        };

        assert!(err.to_string().contains("bad gateway"));
        assert_eq!(client.invocations(), 1);
    }

    #[tokio::test]
    async fn scripted_error_terminates_stream() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::text("Role: "), MockStep::error("connection reset")],
        );

        let mut stream = client
            .complete_stream(request())
            .await
            .expect("stream should open");

        let first = stream.next().await.expect("first item").expect("first chunk");
        assert_eq!(first.text, "Role: ");

        let second = stream.next().await.expect("second item");
        assert!(second.is_err());

        // Terminal failure: nothing follows the error.
        assert!(stream.next().await.is_none());
    }
}
