//! PromptForge client - drives one generation session end to end.
//!
//! [`PromptClient`] issues the request and hands back the raw byte
//! stream; [`SessionManager`] owns the cancel-then-replace session
//! lifecycle and publishes the growing buffer after every fragment.

mod decode;
mod error;
mod http;
mod session;

pub use decode::StreamDecoder;
pub use error::ClientError;
pub use http::PromptClient;
pub use session::{SessionManager, SessionSnapshot};
