//! Local dashboard server: the REST API plus a single embedded admin page.
//! Binds loopback only unless dev mode asks for the network.

pub mod api;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Request},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
pub use api::{AppState, SharedState};

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/dashboard"]
struct Dashboard;

/// Uploads stream through the request body, so the default 2 MB limit is far
/// too small for scanned SDS documents.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4170,
            dev_mode: false,
        }
    }
}

/// Build the full application router: API routes plus the embedded page.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .fallback(static_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve embedded dashboard files; anything unknown falls back to the page
/// itself so a refresh never 404s.
async fn static_handler(req: Request<Body>) -> impl IntoResponse {
    let path = req.uri().path().trim_start_matches('/');

    if !path.is_empty() {
        if let Some(content) = Dashboard::get(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return Response::builder()
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content.data.to_vec()))
                .unwrap()
                .into_response();
        }
    }

    match Dashboard::get("index.html") {
        Some(content) => Html(String::from_utf8_lossy(&content.data).to_string()).into_response(),
        None => (StatusCode::NOT_FOUND, "Dashboard page not embedded").into_response(),
    }
}

/// Start the dashboard server and run until Ctrl+C.
pub async fn start_server(config: AppConfig, token: &str, server: ServerConfig) -> Result<()> {
    config.ensure_directories()?;
    let state = Arc::new(AppState::new(config, token));

    let mut app = build_router(state);
    if server.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if server.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("bindery dashboard running at http://{}", local_addr);
    tracing::info!(addr = %local_addr, dev = server.dev_mode, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    println!("\nShutting down...");
}
