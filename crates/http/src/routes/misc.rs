//! The informational routes (`/`, `/version`) plus the `/healthz`
//! liveness probe.

use axum::{http::StatusCode, Json};

use crate::dto::VersionResponse;

pub async fn index() -> &'static str {
    "tqs: a small HTTP-accessible queue service"
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        tag: option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
        branch: option_env!("TQS_BUILD_BRANCH").unwrap_or("unknown"),
        commit: option_env!("TQS_BUILD_COMMIT").unwrap_or("unknown"),
    })
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
