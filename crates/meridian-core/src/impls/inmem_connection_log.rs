//! InMemoryConnectionLog - プロセス内の接続記録
//!
//! # 実装詳細
//! - Vec<ConnectionRecord> を Mutex で保護（書き込みは直列化される）
//! - レコードは追記のみ。削除・更新はしない
//! - reporting 層向けに snapshot / latest_by_origin を提供

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{ConnectionRecord, StatusCode};
use crate::ports::{Clock, ConnectionAuditLog, SystemClock};

/// Process-wide, append-only connection log kept in memory.
pub struct InMemoryConnectionLog {
    clock: Arc<dyn Clock>,
    records: Mutex<Vec<ConnectionRecord>>,
}

impl InMemoryConnectionLog {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: Mutex::new(Vec::new()),
        }
    }

    // poison されても記録は続ける（record は呼び出し側を失敗させない）
    fn lock(&self) -> MutexGuard<'_, Vec<ConnectionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All records in insertion order.
    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Newest record for every (origin, target) pair, ordered by origin then
    /// target.
    pub fn latest_by_origin(&self) -> Vec<ConnectionRecord> {
        let records = self.lock();
        let mut latest: BTreeMap<(&str, &str), &ConnectionRecord> = BTreeMap::new();
        for record in records.iter() {
            // 後から追記されたものほど新しい
            latest.insert((record.origin.as_str(), record.target.as_str()), record);
        }
        latest.into_values().cloned().collect()
    }
}

impl Default for InMemoryConnectionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionAuditLog for InMemoryConnectionLog {
    fn record(&self, origin: &str, target: &str, status: StatusCode) {
        let record = ConnectionRecord::new(origin, target, status, self.clock.now());
        self.lock().push(record);
    }
}
