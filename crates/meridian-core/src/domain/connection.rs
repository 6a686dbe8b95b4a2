//! Connection audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::StatusCode;

/// One routed inbound call: who asked, for what, and how it ended.
///
/// Records are created once per call and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub origin: String,
    pub target: String,
    pub status: StatusCode,
    pub recorded_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn new(
        origin: impl Into<String>,
        target: impl Into<String>,
        status: StatusCode,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            status,
            recorded_at,
        }
    }
}
