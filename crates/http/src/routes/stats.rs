//! Read-only statistics routes.

use axum::extract::{Path, State};
use axum::Json;
use tqs_common::model::QueueStats;

use crate::app::AppState;
use crate::error::ApiError;

pub async fn stats_all(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let all = state.engine.stats_all()?;
    Ok(Json(serde_json::to_value(all).expect("QueueStats map serializes")))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.engine.stats(&name)?))
}
