//! Response sent back to the calling peer.

use serde::{Deserialize, Serialize};

use crate::domain::{ErrorKind, InfoError, StatusCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    status: StatusCode,
    #[serde(default)]
    body: serde_json::Value,
}

impl InfoResponse {
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// Successful response (200).
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Error response whose status comes from the classifier.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            kind.status_code(),
            serde_json::json!({ "kind": kind, "error": message }),
        )
    }

    pub fn from_error(err: &InfoError) -> Self {
        match err {
            InfoError::Classified { kind, message } => Self::error(*kind, message.as_str()),
            InfoError::Unexpected(_) => Self::error(ErrorKind::InternalError, err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }
}
