//! API server for the Task List API
//!
//! Provides the task REST API backed by a SQLite database.

mod routes;
mod state;

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;
use tasklist_core::task::SqliteTaskStore;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine database location
    let database_url = std::env::var("TASKLIST_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://tasks.db".to_string());

    tracing::info!("Using database: {}", database_url);

    let store = SqliteTaskStore::connect(&database_url)
        .await
        .expect("Failed to initialize task store");
    let app_state = AppState::new(store);

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::task::router())
        .with_state(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("TASKLIST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8081u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("REST API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
