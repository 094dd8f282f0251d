//! HTTP API server for the purchase saga.
//!
//! Exposes purchase submission and status polling over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use purchase::{InMemoryCatalog, PurchaseSagaDefinition, PurchaseStatus};
use saga_engine::{InMemoryBus, NullNotifier, RetryPolicy, TransitionEngine};
use saga_store::InMemorySagaStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::purchases::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/purchases", post(routes::purchases::submit))
        .route("/purchases/{id}/status", get(routes::purchases::status))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the engine, store and bus for a single-process deployment
/// against the given catalog.
pub fn create_default_state(catalog: InMemoryCatalog, retry: RetryPolicy) -> Arc<AppState> {
    let store = InMemorySagaStore::new();
    let bus = InMemoryBus::new();
    let engine = TransitionEngine::new(
        PurchaseSagaDefinition::new(catalog),
        store.clone(),
        bus,
        NullNotifier,
    );
    let status = PurchaseStatus::new(Arc::new(store));

    Arc::new(AppState {
        engine,
        status,
        retry,
    })
}
