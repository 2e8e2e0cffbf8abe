//! Wire shapes for the HTTP surface. Kept separate from
//! `tqs_common::model` because the response shapes encode the
//! external contract's quirks (e.g. `visible_date` mirroring
//! `create_date`) that the stored model does not.

use serde::{Deserialize, Serialize};
use tqs_common::model::{Message, Queue};

/// Deliberately omits `priority`: spec §6's message response shape is
/// exactly `{id, create_date, visible_date, expire_date, body, type,
/// lease_date, lease_uuid, lease_timeout}`, and `tqs.py`'s response
/// never emits a `priority` key either. Priority stays an internal
/// ordering field, not part of the frozen external contract.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub create_date: f64,
    /// Mirrors `create_date`, not the stored `visible_date` column —
    /// an external contract quirk preserved rather than "fixed".
    pub visible_date: f64,
    pub expire_date: f64,
    pub body: String,
    #[serde(rename = "type")]
    pub media_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_date: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_timeout: Option<i64>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            create_date: message.create_date,
            visible_date: message.create_date,
            expire_date: message.expire_date,
            body: message.body,
            media_type: message.media_type.as_str(),
            lease_date: message.lease_date,
            lease_uuid: message.lease_uuid,
            lease_timeout: message.lease_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct QueueView {
    pub name: String,
    pub create_date: f64,
    pub insert_count: i64,
    pub delete_count: i64,
    pub expire_count: i64,
}

impl From<Queue> for QueueView {
    fn from(queue: Queue) -> Self {
        Self {
            name: queue.name,
            create_date: queue.create_date,
            insert_count: queue.insert_count,
            delete_count: queue.delete_count,
            expire_count: queue.expire_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueuesResponse {
    pub queues: Vec<QueueView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQueueRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub messages: Vec<tqs_engine::EnqueueMessage>,
}

/// Query parameters for `GET /queues/{name}` (dequeue). Accepts both
/// the canonical `visibility_timeout` and the long-standing misspelled
/// `visibilty_timeout` alias, preserved for client compatibility.
#[derive(Debug, Deserialize)]
pub struct DequeueQuery {
    pub message_count: Option<i64>,
    #[serde(alias = "visibilty_timeout")]
    pub visibility_timeout: Option<i64>,
    pub wait_time: Option<i64>,
    pub delete: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub tag: &'static str,
    pub branch: &'static str,
    pub commit: &'static str,
}
