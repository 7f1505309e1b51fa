use axum::{extract::State, routing::get, Json, Router};
use config::HubConfig;
use hub::{epoch_ms, Hub};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use ws::ws_handler;

mod config;
mod hub;
mod ws;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("server=info,tower_http=warn")),
        )
        .init();

    let config = HubConfig::from_env();
    let addr = config.addr;
    let hub = Arc::new(Hub::new(config));
    let janitor = hub.clone().spawn_janitor();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(hub.clone());

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub, janitor))
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal(hub: Arc<Hub>, janitor: JoinHandle<()>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::info!("shutdown signal received");
    hub.shutdown();
    janitor.abort();
}

async fn health(State(hub): State<Arc<Hub>>) -> Json<Value> {
    Json(json!({ "status": "ok", "uptimeSecs": hub.uptime_secs() }))
}

async fn stats(State(hub): State<Arc<Hub>>) -> Json<Value> {
    let now = epoch_ms();
    Json(json!({
        "connections": hub.connections.len(),
        "sessions": hub.registry.count(),
        "activeLocations": hub.locations.active_snapshot(now, hub.config.location_ttl_ms()).len(),
        "maxSessions": hub.config.max_sessions,
    }))
}
