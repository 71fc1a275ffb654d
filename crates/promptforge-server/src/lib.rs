//! PromptForge server - proxies one long-lived Gemini streaming call
//! per request and relays the output as a chunked `text/plain` body.

pub mod api;
pub mod config;
