//! Inbound info request as handed over by the transport layer.

use serde::{Deserialize, Serialize};

/// The only method accepted for info calls.
pub const WRITE_METHOD: &str = "POST";

/// Path segment under which capabilities are mounted (`/info/{name}/...`).
pub const MOUNT_SEGMENT: &str = "info";

/// A peer's call, already parsed by the host transport.
///
/// The body is opaque to the router and only interpreted by handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    method: String,
    path: String,
    remote_address: String,
    #[serde(default)]
    body: serde_json::Value,
}

impl InboundRequest {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        remote_address: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            remote_address: remote_address.into(),
            body: serde_json::Value::Null,
        }
    }

    pub fn post(path: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self::new(WRITE_METHOD, path, remote_address)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Full requested path, as recorded in the connection log.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Non-empty path segments after the `/info` mount point.
    ///
    /// `/info/Ping/a` → `["Ping", "a"]`, `/info` → `[]`.
    pub fn target(&self) -> Vec<&str> {
        let mut segments = self.path.split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek() == Some(&MOUNT_SEGMENT) {
            segments.next();
        }
        segments.collect()
    }
}
