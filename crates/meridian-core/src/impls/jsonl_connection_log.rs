//! JsonLinesConnectionLog - 接続記録を 1 行 1 JSON で書き出す
//!
//! 書き込み失敗は warn! に残して握りつぶします（Router には伝えない）。

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::domain::{ConnectionRecord, StatusCode};
use crate::ports::{Clock, ConnectionAuditLog, SystemClock};

pub(crate) const AUDIT_TARGET: &str = "meridian_core::audit";

/// Connection log appending JSON lines to any writer (file, socket, buffer).
pub struct JsonLinesConnectionLog<W> {
    clock: Arc<dyn Clock>,
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesConnectionLog<W> {
    pub fn new(writer: W) -> Self {
        Self::with_clock(writer, Arc::new(SystemClock))
    }

    pub fn with_clock(writer: W, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, record: &ConnectionRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        // 1 レコード = 1 回の write_all なので行が混ざらない
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()
    }
}

impl<W: Write + Send> ConnectionAuditLog for JsonLinesConnectionLog<W> {
    fn record(&self, origin: &str, target: &str, status: StatusCode) {
        let record = ConnectionRecord::new(origin, target, status, self.clock.now());
        if let Err(error) = self.append(&record) {
            warn!(
                target: AUDIT_TARGET,
                origin,
                request_target = target,
                status = status.as_i32(),
                %error,
                "failed to append connection record"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::io;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let log = JsonLinesConnectionLog::with_clock(Vec::new(), Arc::new(FixedClock::new(at)));

        log.record("10.0.0.2", "/info/ping", StatusCode::OK);
        log.record("10.0.0.3", "/info", StatusCode::NOT_FOUND);

        let output = String::from_utf8(log.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: ConnectionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.origin, "10.0.0.2");
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.recorded_at, at);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], 404);
    }

    #[test]
    fn write_failures_are_swallowed() {
        let log = JsonLinesConnectionLog::new(BrokenWriter);
        // panic も Err もしない
        log.record("10.0.0.2", "/info/ping", StatusCode::OK);
    }
}
