//! Ports - 外部への抽象化レイヤー
//!
//! - **Clock**: 現在時刻（SystemClock / FixedClock）
//! - **IdGenerator**: TaskId / RequestId の生成
//! - **ConnectionAuditLog**: 接続記録の append-only sink

pub mod audit_log;
pub mod clock;
pub mod id_generator;

pub use self::audit_log::ConnectionAuditLog;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
