//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryConnectionLog**: 開発・テスト用の接続記録（スナップショット取得可）
//! - **JsonLinesConnectionLog**: 任意の `Write` に 1 行 1 レコードの JSON で書き出す

pub mod inmem_connection_log;
pub mod jsonl_connection_log;

pub use self::inmem_connection_log::InMemoryConnectionLog;
pub use self::jsonl_connection_log::JsonLinesConnectionLog;
