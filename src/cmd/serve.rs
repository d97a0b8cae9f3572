//! Dashboard server command — `bindery serve`.

use anyhow::Result;

use bindery::config::AppConfig;
use bindery::github;
use bindery::server::{self, ServerConfig};

pub async fn cmd_serve(config: AppConfig, port: u16, open_browser: bool, dev: bool) -> Result<()> {
    // fail at startup, not on the first deploy button press
    let token = config.require_token()?.to_string();
    if !github::looks_like_token(&token) {
        tracing::warn!("GITHUB_TOKEN does not look like a GitHub personal access token");
    }

    // Spawn browser open before starting the server (which blocks). Skipped
    // in dev mode, where the UI is usually served elsewhere.
    if open_browser && !dev {
        let url = format!("http://localhost:{}", port);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        });
    }

    server::start_server(
        config,
        &token,
        ServerConfig {
            port,
            dev_mode: dev,
        },
    )
    .await
}
