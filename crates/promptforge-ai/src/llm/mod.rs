//! LLM module - streaming client abstraction over the upstream provider

mod client;
mod gemini;
mod mock_client;

pub use client::{
    CompletionRequest, FinishReason, LlmClient, Message, Role, StreamChunk, StreamResult,
};
pub use gemini::GeminiClient;
pub use mock_client::{MockLlmClient, MockStep, MockStepKind};
