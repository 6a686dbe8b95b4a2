//! CapabilityRegistry - capability 名と handler の対応表
//!
//! # 設計
//! - 起動時に組み立てる（mutable）
//! - 実行時は読み取り専用（`Arc<CapabilityRegistry>` で共有、ロック不要）
//! - 名前は小文字に正規化して登録・検索する

use std::collections::HashMap;
use std::sync::Arc;

use super::capability::InfoRequest;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("capability '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("capability name must not be empty")]
    EmptyName,
}

/// Case-normalized capability name.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Default)]
pub struct CapabilityRegistry {
    handlers: HashMap<String, Arc<dyn InfoRequest>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under its normalized name. Duplicates are rejected.
    pub fn register(&mut self, handler: Arc<dyn InfoRequest>) -> Result<(), RegistryError> {
        let name = normalize(handler.name());
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn InfoRequest>> {
        self.handlers.get(&normalize(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&normalize(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
