use std::sync::Arc;

use promptforge_ai::GeminiClient;
use promptforge_server::api::{self, state::AppService};
use promptforge_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promptforge_server=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting PromptForge server");

    let config = ServerConfig::load().expect("Failed to load server configuration");

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set. Generation requests will fail.");
    }

    let llm = GeminiClient::new(config.gemini_api_key.clone().unwrap_or_default());
    let state = Arc::new(AppService {
        config: config.clone(),
        llm: Arc::new(llm),
    });

    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("Failed to bind {}: {}", addr, err));

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
