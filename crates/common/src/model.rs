//! The data model described in the system's design: queues, messages,
//! and the lease triple embedded on a message. A lease is not a
//! separate entity — it is three nullable columns on `Message`.

use serde::{Deserialize, Serialize};

/// Body media type. Three values are admissible; `text/plain` is the
/// default when a message omits `type` on enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/octet-stream")]
    OctetStream,
}

impl MediaType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text/plain" => Some(Self::TextPlain),
            "application/json" => Some(Self::Json),
            "application/octet-stream" => Some(Self::OctetStream),
            _ => None,
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::TextPlain
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, durable queue. `id` and `create_date` are assigned by the
/// store on creation; the three counters are monotonically
/// non-decreasing for the life of the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub id: i64,
    pub name: String,
    pub create_date: f64,
    pub insert_count: i64,
    pub delete_count: i64,
    pub expire_count: i64,
}

/// A message row, including its optional lease triple. The three
/// lease fields are `Some` together or `None` together — there is no
/// state where only one of them is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub queue_id: i64,
    pub create_date: f64,
    pub visible_date: f64,
    pub expire_date: f64,
    pub body: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub priority: i64,
    pub lease_date: Option<f64>,
    pub lease_uuid: Option<String>,
    pub lease_timeout: Option<i64>,
}

impl Message {
    /// `delayed`: not leased and not yet visible.
    pub fn is_delayed(&self, now: f64) -> bool {
        self.lease_date.is_none() && self.visible_date > now
    }

    /// `visible`: not leased, past its visibility date, not yet expired.
    pub fn is_visible(&self, now: f64) -> bool {
        self.lease_date.is_none() && self.visible_date <= now && self.expire_date >= now
    }

    /// `leased`: an active, unexpired lease.
    pub fn is_leased(&self, now: f64) -> bool {
        match (self.lease_date, self.lease_timeout) {
            (Some(lease_date), Some(lease_timeout)) => lease_date + lease_timeout as f64 >= now,
            _ => false,
        }
    }
}

/// Derived per-queue counts, computed on demand from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub visible: i64,
    pub leased: i64,
    pub delayed: i64,
}
