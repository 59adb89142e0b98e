use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::{CopyEngine, PatternEngine};
use crate::storage::BenchmarkStore;

use super::handlers::{
    aggregate_records, get_benchmarks, health_check, put_benchmarks, AppState,
};

pub fn create_api_router(store: Arc<dyn BenchmarkStore>, max_rows: usize) -> Router {
    let state = Arc::new(AppState {
        store,
        patterns: PatternEngine::new(),
        copy: CopyEngine::new(),
        max_rows,
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/aggregate", post(aggregate_records))
        .route(
            "/api/benchmarks/{account_id}",
            get(get_benchmarks).put(put_benchmarks),
        )
        // Dashboard frontends are served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
