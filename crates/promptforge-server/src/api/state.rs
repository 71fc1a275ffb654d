use std::sync::Arc;

use promptforge_ai::LlmClient;

use crate::config::ServerConfig;

/// Application state shared across all API handlers
pub struct AppService {
    pub config: ServerConfig,
    pub llm: Arc<dyn LlmClient>,
}

pub type AppState = Arc<AppService>;
