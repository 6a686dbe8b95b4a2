//! ConnectionAuditLog port - 受信した info request の記録先
//!
//! InfoRequestRouter は呼び出し 1 回につき必ず 1 回 `record` を呼びます。

use crate::domain::StatusCode;

/// Append-only sink for connection records.
///
/// `record` never fails the caller: implementations swallow (and log) their
/// own I/O problems. Concurrent callers must be serialized internally so that
/// records are neither interleaved nor lost.
pub trait ConnectionAuditLog: Send + Sync {
    fn record(&self, origin: &str, target: &str, status: StatusCode);
}
