//! PromptForge AI - upstream model stream adapter
//!
//! Wraps the Gemini streaming API behind the [`LlmClient`] trait and
//! exposes generation output as a lazy, order-preserving sequence of
//! [`StreamChunk`]s.

pub mod error;
mod http_client;
pub mod llm;
pub mod prompt;

pub use error::{AiError, Result};
pub use llm::{
    CompletionRequest, FinishReason, GeminiClient, LlmClient, Message, MockLlmClient, MockStep,
    Role, StreamChunk, StreamResult,
};
pub use prompt::{MASTER_PROMPT, MASTER_PROMPT_VERSION, build_completion_request};
