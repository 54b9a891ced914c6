// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::history_repository::HistoryRepository;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::file_repository::JsonFileHistoryRepository;
use crate::infrastructure::memory_repository::InMemoryHistoryRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_input_entry, clear_history, close_checklist, close_input_session, degradation_chart_data,
    delete_history_record, evaluate_degradation, evaluate_degradation_merge,
    evaluate_input_session, evaluate_performance, evaluate_performance_batch, get_checklist,
    get_history_record, get_input_session, health_check, list_history, open_checklist,
    open_input_session, performance_chart_data, remove_input_entry, reset_input_session,
    set_checklist_item,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn HistoryRepository> = match &config.history.storage_dir {
        Some(dir) => Arc::new(JsonFileHistoryRepository::open(dir, config.history.capacity).await?),
        None => Arc::new(InMemoryHistoryRepository::new(config.history.capacity)),
    };

    // Create services (application layer)
    let state = Arc::new(AppState::build(repository, &config));

    // Build router (presentation layer)
    // Responses are Brotli-encoded by the handlers themselves, so no CompressionLayer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/performance/evaluations", post(evaluate_performance))
        .route("/performance/batch", post(evaluate_performance_batch))
        .route("/performance/sessions", post(open_input_session))
        .route(
            "/performance/sessions/:session",
            get(get_input_session).delete(close_input_session),
        )
        .route(
            "/performance/sessions/:session/entries",
            post(add_input_entry).delete(reset_input_session),
        )
        .route(
            "/performance/sessions/:session/entries/:index",
            delete(remove_input_entry),
        )
        .route("/performance/sessions/:session/evaluate", post(evaluate_input_session))
        .route("/degradation/evaluations", post(evaluate_degradation))
        .route("/degradation/evaluations/merge", post(evaluate_degradation_merge))
        .route("/history/:kind", get(list_history).delete(clear_history))
        .route(
            "/history/:kind/:id",
            get(get_history_record).delete(delete_history_record),
        )
        .route("/charts/degradation", get(degradation_chart_data))
        .route("/charts/performance", get(performance_chart_data))
        .route("/checklists", post(open_checklist))
        .route("/checklists/:context", get(get_checklist).delete(close_checklist))
        .route("/checklists/:context/items", put(set_checklist_item))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid server.addr '{}'", config.server.addr))?;
    tracing::info!(%addr, "starting insulation-monitor service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
