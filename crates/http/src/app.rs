//! Router assembly: wires the routing table to the engine, and layers
//! the request-id + access-log middleware and the optional
//! `Authentication` gate. Scaled down to this service's single
//! concern — no CORS, no metrics registry, no websockets.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get},
    Router,
};
use tqs_engine::{QueueEngine, SystemClock};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::auth::require_api_token;
use crate::error::{attach_request_id_header, REQUEST_ID_HEADER};
use crate::routes::{misc, queues, stats};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueueEngine<SystemClock>>,
}

pub fn build_router(state: AppState, api_token: Option<String>) -> Router {
    let public = Router::new()
        .route("/", get(misc::index))
        .route("/version", get(misc::version))
        .route("/healthz", get(misc::healthz));

    let protected = Router::new()
        .route("/queues", get(queues::list_queues).post(queues::create_queue))
        .route("/queues/{name}", get(queues::dequeue).post(queues::enqueue).delete(queues::delete_queue))
        .route("/queues/{name}/leases/{uuid}", delete(queues::ack))
        .route("/statistics", get(stats::stats_all))
        .route("/queues/{name}/statistics", get(stats::stats))
        .layer(middleware::from_fn_with_state(Arc::new(api_token), require_api_token));

    public.merge(protected).with_state(state).layer(middleware::from_fn(request_context_middleware))
}

async fn request_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if !request.headers().contains_key(REQUEST_ID_HEADER) {
        if let Ok(value) = request_id.parse() {
            request.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();
    let span = info_span!("tqs.http.request", request_id = %request_id, %method, %path);

    let mut response = next.run(request).instrument(span).await;
    attach_request_id_header(&mut response, &request_id);

    info!(
        request_id = %request_id,
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        "tqs_request"
    );

    response
}
