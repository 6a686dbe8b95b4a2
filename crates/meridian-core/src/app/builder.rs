//! NodeBuilder - capability の登録と Router の組み立て
//!
//! # Fail-fast 設計
//! - `expect_capabilities()` で必ず存在すべき capability 名を宣言
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す（起動時に気付ける）

use std::sync::Arc;

use crate::info::{CapabilityRegistry, InfoRequest, InfoRequestRouter, RegistryError, normalize};
use crate::ports::ConnectionAuditLog;

/// Errors raised while assembling a node.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing capabilities: {0:?}. These were expected but not registered.")]
    MissingCapabilities(Vec<String>),
}

/// Builds the capability registry and the router that serves it.
///
/// ```ignore
/// let router = NodeBuilder::new()
///     .register(Arc::new(PingRequest))?
///     .expect_capabilities(&["ping"])
///     .build(audit_log)?;
/// ```
pub struct NodeBuilder {
    registry: CapabilityRegistry,
    expected: Option<Vec<String>>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            registry: CapabilityRegistry::new(),
            expected: None,
        }
    }

    pub fn register(mut self, handler: Arc<dyn InfoRequest>) -> Result<Self, RegistryError> {
        self.registry.register(handler)?;
        Ok(self)
    }

    /// Declares capability names that must be registered before `build()`.
    pub fn expect_capabilities(mut self, names: &[&str]) -> Self {
        self.expected = Some(names.iter().map(|name| normalize(name)).collect());
        self
    }

    pub fn build(self, audit: Arc<dyn ConnectionAuditLog>) -> Result<InfoRequestRouter, BuildError> {
        if let Some(expected) = &self.expected {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !self.registry.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingCapabilities(missing));
            }
        }
        Ok(InfoRequestRouter::new(Arc::new(self.registry), audit))
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
