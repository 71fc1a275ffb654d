//! Master prompt preamble and fixed generation parameters.
//!
//! The preamble is versioned and deployment-fixed; user input is only
//! ever appended after it. Generation parameters are likewise fixed so
//! output format stays predictable.

use crate::llm::{CompletionRequest, Message};

/// Bump when the preamble wording changes.
pub const MASTER_PROMPT_VERSION: &str = "1";

pub const MASTER_PROMPT: &str = r#"You are an expert prompt engineer specializing in creating concise, effective prompts for AI agents. Your task is to transform user descriptions into well-structured agent prompts.

## Guidelines

1. **Be Concise**: Generate the shortest possible prompt that captures all requirements. Avoid unnecessary words.

2. **Structure**: Use this format:
   - **Role**: One sentence defining the agent's identity
   - **Task**: Clear, specific instructions (2-4 sentences max)
   - **Constraints**: Key limitations or rules (bullet points)
   - **Output Format**: Expected response structure (if applicable)

3. **Quality Principles**:
   - Use imperative mood ("Analyze...", "Generate...", "Review...")
   - Be specific, not vague ("Check for SQL injection" not "Check for security issues")
   - Include success criteria when relevant
   - Avoid meta-instructions about being an AI

4. **Keep It Short**:
   - Total prompt should be under 300 words
   - Prefer bullet points over paragraphs
   - Remove filler words and redundancies

## Output Format

Return ONLY the generated prompt in markdown format. Do not include explanations, commentary, or meta-text about the prompt itself. The output should be ready to copy and use directly.

---

User Request:
"#;

const MAX_OUTPUT_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;

/// Build the completion request for one user description.
pub fn build_completion_request(user_prompt: &str) -> CompletionRequest {
    CompletionRequest::new(vec![
        Message::system(MASTER_PROMPT),
        Message::user(user_prompt),
    ])
    .with_max_tokens(MAX_OUTPUT_TOKENS)
    .with_temperature(TEMPERATURE)
    .with_top_p(TOP_P)
}
