use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tqs_common::model::{MediaType, Message, Queue, QueueStats};
use tqs_common::validate;
use tqs_store::{NewMessage, Store};

use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;

const LONG_POLL_INTERVAL_MS: u64 = 250;

/// One message as submitted to `enqueue`, before validation/defaulting.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueMessage {
    pub body: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub delay: Option<i64>,
    pub retention: Option<i64>,
    pub priority: Option<i64>,
}

/// Parameters to `dequeue`, before validation/defaulting. `None`
/// selects the design's documented default for that field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DequeueParams {
    pub message_count: Option<i64>,
    pub visibility_timeout: Option<i64>,
    pub wait_time: Option<i64>,
    pub delete: bool,
}

/// Implements create/list/delete queue, enqueue, lease-dequeue, ack,
/// and per-queue/all-queue statistics against a `Store`. Owns every
/// invariant around visibility, retention, and leases; the HTTP
/// surface only translates requests into calls here.
pub struct QueueEngine<C: Clock = SystemClock> {
    store: Arc<Store>,
    clock: Arc<C>,
}

impl QueueEngine<SystemClock> {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store, clock: Arc::new(SystemClock) }
    }
}

impl<C: Clock> QueueEngine<C> {
    pub fn with_clock(store: Arc<Store>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    pub fn create_queue(&self, name: &str) -> Result<Queue, EngineError> {
        if !validate::validate_queue_name(name) {
            return Err(EngineError::BadRequest(format!("invalid queue name: `{name}`")));
        }
        Ok(self.store.create_queue(name, self.clock.now())?)
    }

    pub fn list_queues(&self) -> Result<Vec<Queue>, EngineError> {
        Ok(self.store.list_queues()?)
    }

    pub fn delete_queue(&self, name: &str) -> Result<(), EngineError> {
        if self.store.delete_queue(name)? {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("no such queue: `{name}`")))
        }
    }

    /// All messages are validated before any side effect. An empty
    /// list is accepted and is a no-op that still returns success.
    pub fn enqueue(&self, queue_name: &str, messages: &[EnqueueMessage]) -> Result<(), EngineError> {
        let queue = self.require_queue(queue_name)?;

        let now = self.clock.now();
        let mut rows = Vec::with_capacity(messages.len());
        for message in messages {
            rows.push(validate_and_default_message(message, now)?);
        }

        Ok(self.store.enqueue(queue.id, &rows)?)
    }

    /// Leases (or deletes, if `params.delete`) up to `message_count`
    /// visible messages, long-polling in 250ms increments for up to
    /// `wait_time` seconds when none are immediately available.
    ///
    /// `message_count`/`visibility_timeout`/`wait_time` are clamped to
    /// their documented maximums rather than rejected, mirroring
    /// `tqs.py`'s `min(int(...), MAX)` parsing: this endpoint's only
    /// 4xx in the routing table is 404 for an unknown queue, so an
    /// out-of-range dequeue parameter is not a 400 here.
    pub async fn dequeue(
        &self,
        queue_name: &str,
        params: DequeueParams,
    ) -> Result<Vec<Message>, EngineError> {
        let message_count = params
            .message_count
            .unwrap_or(validate::DEFAULT_MESSAGE_COUNT)
            .min(validate::MAX_MESSAGE_COUNT);
        let visibility_timeout = params
            .visibility_timeout
            .unwrap_or(validate::DEFAULT_VISIBILITY_TIMEOUT)
            .min(validate::MAX_VISIBILITY_TIMEOUT);
        let wait_time =
            params.wait_time.unwrap_or(validate::DEFAULT_WAIT_TIME).min(validate::MAX_WAIT_TIME);

        let queue = self.require_queue(queue_name)?;
        let deadline = self.clock.now() + wait_time as f64;

        loop {
            let now = self.clock.now();
            let rows = if params.delete {
                self.store.delete_candidates(queue.id, now, message_count)?
            } else {
                self.store.lease_candidates(queue.id, now, message_count, visibility_timeout)?
            };

            if !rows.is_empty() || now > deadline {
                return Ok(rows);
            }
            if wait_time == 0 {
                return Ok(rows);
            }
            tokio::time::sleep(std::time::Duration::from_millis(LONG_POLL_INTERVAL_MS)).await;
        }
    }

    /// Deletes the message identified by `(queue, lease_uuid)`. Not
    /// idempotent: a second ack of the same lease returns `NotFound`.
    pub fn ack(&self, queue_name: &str, lease_uuid: &str) -> Result<(), EngineError> {
        let queue = self.require_queue(queue_name)?;
        if self.store.ack(queue.id, lease_uuid)? {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("no such lease: `{lease_uuid}`")))
        }
    }

    pub fn stats(&self, queue_name: &str) -> Result<QueueStats, EngineError> {
        let queue = self.require_queue(queue_name)?;
        Ok(self.store.stats(queue.id, self.clock.now())?)
    }

    pub fn stats_all(&self) -> Result<HashMap<String, QueueStats>, EngineError> {
        Ok(self.store.stats_all()?)
    }

    fn require_queue(&self, name: &str) -> Result<Queue, EngineError> {
        self.store
            .get_queue_by_name(name)?
            .ok_or_else(|| EngineError::NotFound(format!("no such queue: `{name}`")))
    }
}

fn validate_and_default_message(
    message: &EnqueueMessage,
    now: f64,
) -> Result<NewMessage, EngineError> {
    if !validate::validate_message_body(&message.body) {
        return Err(EngineError::BadRequest("body exceeds maximum length".into()));
    }

    let media_type = match &message.media_type {
        None => MediaType::default(),
        Some(raw) => MediaType::parse(raw)
            .ok_or_else(|| EngineError::BadRequest(format!("invalid message type: `{raw}`")))?,
    };

    let delay = message.delay.unwrap_or(validate::DEFAULT_MESSAGE_DELAY);
    if !validate::validate_message_delay(delay) {
        return Err(EngineError::BadRequest("delay out of range".into()));
    }

    let retention = message.retention.unwrap_or(validate::DEFAULT_MESSAGE_RETENTION);
    if !validate::validate_message_retention(retention) {
        return Err(EngineError::BadRequest("retention out of range".into()));
    }

    let priority = message.priority.unwrap_or(validate::DEFAULT_PRIORITY);
    if !validate::validate_priority(priority) {
        return Err(EngineError::BadRequest("priority out of range".into()));
    }

    Ok(NewMessage {
        create_date: now,
        visible_date: now + delay as f64,
        expire_date: now + retention as f64,
        body: message.body.clone(),
        media_type,
        priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn engine() -> (QueueEngine<FakeClock>, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new(1_000.0));
        let store = Arc::new(Store::open(":memory:", clock.now()).unwrap());
        (QueueEngine::with_clock(store, Arc::clone(&clock)), clock)
    }

    fn simple_message(body: &str) -> EnqueueMessage {
        EnqueueMessage {
            body: body.to_string(),
            media_type: None,
            delay: None,
            retention: None,
            priority: None,
        }
    }

    #[test]
    fn create_queue_rejects_bad_name() {
        let (engine, _clock) = engine();
        let err = engine.create_queue("").unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
    }

    #[test]
    fn create_queue_surfaces_conflict_on_duplicate() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        let err = engine.create_queue("jobs").unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn enqueue_rejects_entire_request_on_first_invalid_message() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();

        let mut oversized = simple_message("ok");
        oversized.retention = Some(1);
        let messages = vec![simple_message("fine"), oversized];

        let err = engine.enqueue("jobs", &messages).unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));

        // No partial side effects: the first, valid message was not inserted either.
        let stats = engine.stats("jobs").unwrap();
        assert_eq!(stats.visible, 0);
    }

    #[test]
    fn enqueue_empty_list_is_a_no_op_success() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        engine.enqueue("jobs", &[]).unwrap();
        let stats = engine.stats("jobs").unwrap();
        assert_eq!(stats.visible, 0);
    }

    #[test]
    fn enqueue_against_missing_queue_is_not_found() {
        let (engine, _clock) = engine();
        let err = engine.enqueue("missing", &[simple_message("x")]).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn dequeue_returns_in_fifo_order_within_default_priority() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        let messages: Vec<EnqueueMessage> =
            (0..7).map(|i| simple_message(&i.to_string())).collect();
        engine.enqueue("jobs", &messages).unwrap();

        let mut seen = Vec::new();
        for _ in 0..7 {
            let batch = engine
                .dequeue(
                    "jobs",
                    DequeueParams { message_count: Some(1), ..Default::default() },
                )
                .await
                .unwrap();
            assert_eq!(batch.len(), 1);
            seen.push(batch[0].body.clone());
        }
        assert_eq!(seen, vec!["0", "1", "2", "3", "4", "5", "6"]);
    }

    #[tokio::test]
    async fn dequeue_orders_by_priority_descending_first() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();

        let priorities = [None, Some(25), Some(15), Some(75), Some(85), Some(5), Some(25), Some(85), None];
        let messages: Vec<EnqueueMessage> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| EnqueueMessage {
                body: (i + 1).to_string(),
                media_type: None,
                delay: None,
                retention: None,
                priority: *p,
            })
            .collect();
        engine.enqueue("jobs", &messages).unwrap();

        let mut seen = Vec::new();
        for _ in 0..9 {
            let batch = engine
                .dequeue(
                    "jobs",
                    DequeueParams { message_count: Some(1), ..Default::default() },
                )
                .await
                .unwrap();
            seen.push(batch[0].body.clone());
        }
        assert_eq!(seen, vec!["5", "8", "4", "1", "9", "2", "7", "3", "6"]);
    }

    #[tokio::test]
    async fn dequeue_respects_batch_size_across_calls() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        let messages: Vec<EnqueueMessage> =
            (0..17).map(|i| simple_message(&i.to_string())).collect();
        engine.enqueue("jobs", &messages).unwrap();

        let first = engine
            .dequeue("jobs", DequeueParams { message_count: Some(10), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(first.len(), 10);

        let second = engine
            .dequeue("jobs", DequeueParams { message_count: Some(5), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(second.len(), 5);

        let third = engine
            .dequeue("jobs", DequeueParams { message_count: Some(5), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn delayed_message_becomes_visible_then_re_visible_after_lease_expiry() {
        let (engine, clock) = engine();
        engine.create_queue("jobs").unwrap();
        engine
            .enqueue(
                "jobs",
                &[EnqueueMessage {
                    body: "hello".into(),
                    media_type: None,
                    delay: Some(7),
                    retention: None,
                    priority: None,
                }],
            )
            .unwrap();

        let immediate = engine
            .dequeue("jobs", DequeueParams { message_count: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert!(immediate.is_empty());

        clock.advance(7.0);
        let after_delay = engine
            .dequeue(
                "jobs",
                DequeueParams {
                    message_count: Some(1),
                    visibility_timeout: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after_delay.len(), 1);

        clock.advance(6.0);
        let after_lease_expiry = engine
            .dequeue("jobs", DequeueParams { message_count: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert!(after_lease_expiry.is_empty(), "lease has not been swept yet, it is still held");
    }

    #[tokio::test]
    async fn ack_is_not_idempotent() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        engine.enqueue("jobs", &[simple_message("cheese")]).unwrap();

        let leased = engine
            .dequeue("jobs", DequeueParams { message_count: Some(1), ..Default::default() })
            .await
            .unwrap();
        let lease_uuid = leased[0].lease_uuid.clone().unwrap();

        engine.ack("jobs", &lease_uuid).unwrap();
        let err = engine.ack("jobs", &lease_uuid).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn dequeue_with_delete_returns_messages_without_lease_fields() {
        let (engine, _clock) = engine();
        engine.create_queue("jobs").unwrap();
        engine.enqueue("jobs", &[simple_message("cheese")]).unwrap();

        let deleted = engine
            .dequeue(
                "jobs",
                DequeueParams { message_count: Some(1), delete: true, ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].lease_uuid.is_none());

        let again = engine
            .dequeue("jobs", DequeueParams { message_count: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn delete_queue_cascades_and_then_not_found() {
        let (engine, _clock) = engine();
        engine.create_queue("a").unwrap();
        engine.enqueue("a", &[simple_message("x")]).unwrap();
        engine.delete_queue("a").unwrap();

        let err = engine.delete_queue("a").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        let err = engine.stats("a").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
