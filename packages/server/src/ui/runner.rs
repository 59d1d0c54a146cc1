//! Server startup and routing.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    domain::MessageRepository,
    error::ServerError,
    infrastructure::repository::{InMemoryMessageRepository, SqliteMessageRepository},
    usecase::StatsReporter,
};

use super::{
    handler::{VIEWER_HEADER, health_check, post_message, room_history, stats, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the router for the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.frontend_url.clone());
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/stats", get(stats))
        .route(
            "/api/rooms/{room_id}/messages",
            get(room_history).post(post_message),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: Option<HeaderValue>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(VIEWER_HEADER)]);
    match frontend_url {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Run the relay until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let repository: Arc<dyn MessageRepository> = match &config.database_url {
        Some(url) => {
            tracing::info!("Using SQLite message store at {}", url);
            Arc::new(SqliteMessageRepository::connect(url).await?)
        }
        None => {
            tracing::warn!("No --database-url given; messages are kept in memory only");
            Arc::new(InMemoryMessageRepository::new())
        }
    };

    match &config.frontend_url {
        Some(origin) => tracing::info!("CORS allows origin {:?}", origin),
        None => tracing::info!("CORS allows any origin"),
    }

    let state = Arc::new(AppState::new(repository, &config));

    let reporter = StatsReporter::new(state.registry.clone(), config.stats_interval).spawn();

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Relay listening on {}", listener.local_addr()?);

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    result?;

    tracing::info!("Relay stopped");
    Ok(())
}
