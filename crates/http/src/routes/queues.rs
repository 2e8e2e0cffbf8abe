//! Queue and message routes: the bulk of the service's routing table.
//! Each handler is a thin translation from HTTP into one
//! `tqs_engine::QueueEngine` call — all the validation and state
//! machine logic lives there.

use axum::extract::{Path, Query, State};
use axum::Json;
use tqs_common::validate;
use tqs_engine::DequeueParams;

use crate::app::AppState;
use crate::dto::{
    CreateQueueRequest, DequeueQuery, EmptyResponse, EnqueueRequest, MessageView,
    MessagesResponse, QueueView, QueuesResponse,
};
use crate::error::ApiError;
use crate::json::ApiJson;

pub async fn list_queues(State(state): State<AppState>) -> Result<Json<QueuesResponse>, ApiError> {
    let queues = state.engine.list_queues()?;
    Ok(Json(QueuesResponse { queues: queues.into_iter().map(QueueView::from).collect() }))
}

pub async fn create_queue(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateQueueRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.engine.create_queue(&body.name)?;
    Ok(Json(EmptyResponse {}))
}

pub async fn delete_queue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.engine.delete_queue(&name)?;
    Ok(Json(EmptyResponse {}))
}

pub async fn enqueue(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(body): ApiJson<EnqueueRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.engine.enqueue(&name, &body.messages)?;
    Ok(Json(EmptyResponse {}))
}

pub async fn dequeue(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DequeueQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let params = DequeueParams {
        message_count: query.message_count,
        visibility_timeout: query.visibility_timeout,
        wait_time: query.wait_time,
        delete: validate::parse_delete_flag(query.delete.as_deref()),
    };
    let messages = state.engine.dequeue(&name, params).await?;
    Ok(Json(MessagesResponse { messages: messages.into_iter().map(MessageView::from).collect() }))
}

pub async fn ack(
    State(state): State<AppState>,
    Path((name, lease_uuid)): Path<(String, String)>,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.engine.ack(&name, &lease_uuid)?;
    Ok(Json(EmptyResponse {}))
}
