//! Queue job: one pending unit of work owned by a single topic list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;

/// Job payloads are JSON objects.
pub type JobPayload = serde_json::Map<String, serde_json::Value>;

/// A pending job in a topic's FIFO.
///
/// `attempts` counts failed deliveries so far. It is omitted from the file
/// while zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJob {
    pub id: JobId,
    pub payload: JobPayload,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub attempts: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl QueueJob {
    pub fn new(id: JobId, payload: JobPayload, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            enqueued_at,
            attempts: 0,
        }
    }
}
