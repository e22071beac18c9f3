//! HTTP surface of the healthcare assistant.

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use std::{env, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use colored::Colorize;
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        chat::chat_route::chat,
        directory_route::list_directory,
        health_route::health,
        history_route::{clear_history, get_history},
        models_route::list_models,
        suggestions_route::suggestions,
    },
};

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

/// Builds the application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/history", get(get_history).delete(clear_history))
        .route("/directory", get(list_directory))
        .route("/suggestions", get(suggestions))
        .route("/health", get(health))
        .route("/models", get(list_models))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Loads state from env, binds `API_ADDRESS` and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env().await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;

    println!(
        "{} healthcare assistant listening on {}",
        "▶".green().bold(),
        format!("http://{host_url}").cyan()
    );
    info!(address = %host_url, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
