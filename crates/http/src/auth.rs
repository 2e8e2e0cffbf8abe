//! `Authentication: token <token>` middleware, applied to every route
//! but `/`, `/version`, and `/healthz`. State-carried expected value,
//! `Next`-delegating on success, a structured 401 on failure.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

const AUTH_HEADER: &str = "Authentication";

pub async fn require_api_token(
    State(expected_token): State<Arc<Option<String>>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_token) = expected_token.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_token_scheme);

    match provided {
        Some(token) if token == expected_token => next.run(request).await,
        _ => ApiError::unauthorized("missing or invalid Authentication header").into_response(),
    }
}

fn parse_token_scheme(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
