use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

mod analyze;
mod error;
mod gemini;
mod normalize;
mod prompt;
mod repair;
mod schema;
mod validate;
mod word_tree;

use gemini::{GeminiClient, GeminiConfig};

/// Shared per-process state. The Gemini client is read-only after
/// construction, so one handle serves every request.
#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiClient>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match GeminiConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            log::error!("{error}");
            std::process::exit(1);
        }
    };
    log::info!(
        "Using model {primary} (fallback: {fallback})",
        primary = config.primary_model,
        fallback = config.fallback_model,
    );

    let state = AppState {
        gemini: Arc::new(GeminiClient::new(config)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Hello from fly.io!" }))
        .route("/analyze", post(analyze::analyze))
        .route("/word-tree", post(word_tree::word_tree))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    println!("Listening on port 8080");
    axum::serve(listener, app).await.unwrap();
}
