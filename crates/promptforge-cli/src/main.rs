use std::io::Write;

use anyhow::Result;
use clap::Parser;

use promptforge_client::{PromptClient, SessionManager};

/// Generate a structured agent prompt from a free-text description.
#[derive(Parser)]
#[command(name = "promptforge", version)]
struct Cli {
    /// Description of the agent you want a prompt for
    description: String,

    /// PromptForge server to talk to
    #[arg(long, env = "PROMPTFORGE_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut manager = SessionManager::new(PromptClient::new(&cli.server));
    let mut snapshots = manager.subscribe();
    let handle = manager.submit(cli.description);

    // Print each newly appended suffix as it streams in.
    let mut printed = 0;
    let mut stdout = std::io::stdout();
    while snapshots.changed().await.is_ok() {
        let (suffix, loading) = {
            let snapshot = snapshots.borrow_and_update();
            (snapshot.buffer[printed.min(snapshot.buffer.len())..].to_string(), snapshot.loading)
        };
        if !suffix.is_empty() {
            print!("{suffix}");
            stdout.flush().ok();
            printed += suffix.len();
        }
        if !loading {
            break;
        }
    }

    handle.await.ok();

    let final_snapshot = snapshots.borrow().clone();
    if let Some(error) = final_snapshot.error {
        anyhow::bail!("{error}");
    }

    println!();
    Ok(())
}
