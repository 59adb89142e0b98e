use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{
    aggregate, apply_view, classify_row, AggregateRow, AggregationLevel, BenchmarkThresholds,
    CopyEngine, GroupMode, MetricId, PatternEngine, PerformanceRecord, RawRecord, Tier,
    ViewOptions,
};
use crate::storage::BenchmarkStore;

pub struct AppState {
    pub store: Arc<dyn BenchmarkStore>,
    pub patterns: PatternEngine,
    pub copy: CopyEngine,
    pub max_rows: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    /// Account whose stored benchmarks classify the rows; omit for neutral
    /// tiers everywhere.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Aggregation level, 1 (broadest) to 5 (exact).
    pub level: u8,

    #[serde(default = "default_mode")]
    pub mode: GroupMode,

    #[serde(flatten)]
    pub view: ViewOptions,

    /// Raw export records; fetching them from the ads platform is the
    /// caller's concern.
    pub records: Vec<RawRecord>,
}

fn default_mode() -> GroupMode {
    GroupMode::Creative
}

/// Aggregate row plus its per-metric performance tiers.
#[derive(Serialize)]
pub struct ClassifiedRow {
    #[serde(flatten)]
    pub row: AggregateRow,
    pub tiers: HashMap<MetricId, Tier>,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub rows: Vec<ClassifiedRow>,
    /// Row count before the response cap was applied.
    pub total: usize,
    pub truncated: bool,
    pub generated_at: DateTime<Utc>,
}

/// Run the full pipeline over a posted record export.
pub async fn aggregate_records(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AggregateRequest>,
) -> Result<Json<AggregateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let level = AggregationLevel::from_u8(payload.level).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let thresholds = match payload.account_id.as_deref() {
        Some(account_id) => match state.store.get(account_id).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Failed to load benchmarks for {account_id}: {e}");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to load benchmarks".to_string(),
                    }),
                ));
            }
        },
        None => BenchmarkThresholds::default(),
    };

    let records: Vec<PerformanceRecord> = payload
        .records
        .into_iter()
        .map(PerformanceRecord::from_raw)
        .collect();

    let rows = aggregate(&records, level, payload.mode, &state.patterns, &state.copy);
    let rows = apply_view(rows, &payload.view);
    let total = rows.len();
    let truncated = total > state.max_rows;

    let rows: Vec<ClassifiedRow> = rows
        .into_iter()
        .take(state.max_rows)
        .map(|row| ClassifiedRow {
            tiers: classify_row(&row.metrics, &thresholds),
            row,
        })
        .collect();

    Ok(Json(AggregateResponse {
        rows,
        total,
        truncated,
        generated_at: Utc::now(),
    }))
}

/// Stored benchmark thresholds for an account.
pub async fn get_benchmarks(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<BenchmarkThresholds>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&account_id).await {
        Ok(Some(thresholds)) => Ok(Json(thresholds)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No benchmarks configured for this account".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to load benchmarks for {account_id}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load benchmarks".to_string(),
                }),
            ))
        }
    }
}

/// Upsert the full threshold map for an account.
pub async fn put_benchmarks(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(thresholds): Json<BenchmarkThresholds>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match state.store.put(&account_id, &thresholds).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            tracing::error!("Failed to store benchmarks for {account_id}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to store benchmarks".to_string(),
                }),
            ))
        }
    }
}

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
