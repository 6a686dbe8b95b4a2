//! App - 組み立てと設定
//!
//! - **NodeBuilder**: capability の登録と InfoRequestRouter の構築（fail-fast）
//! - **NodeConfig**: dispatcher / telemetry の設定（JSON）

pub mod builder;
pub mod config;

pub use self::builder::{BuildError, NodeBuilder};
pub use self::config::{ConfigError, LogFormat, NodeConfig, TelemetryConfig};
