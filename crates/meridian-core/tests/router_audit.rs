//! One connection record per routed call, whatever the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rstest::rstest;

use meridian_core::app::NodeBuilder;
use meridian_core::domain::{ErrorKind, InfoError, StatusCode};
use meridian_core::impls::{InMemoryConnectionLog, JsonLinesConnectionLog};
use meridian_core::info::{InboundRequest, InfoRequest, InfoResponse};
use meridian_core::ports::FixedClock;

struct Classified(&'static str, ErrorKind);

#[async_trait]
impl InfoRequest for Classified {
    fn name(&self) -> &str {
        self.0
    }

    async fn handle(
        &self,
        _request: &InboundRequest,
        _arguments: &[String],
    ) -> Result<InfoResponse, InfoError> {
        Err(InfoError::new(self.1, "scripted"))
    }
}

struct Pong;

#[async_trait]
impl InfoRequest for Pong {
    fn name(&self) -> &str {
        "ping"
    }

    async fn handle(
        &self,
        _request: &InboundRequest,
        arguments: &[String],
    ) -> Result<InfoResponse, InfoError> {
        Ok(InfoResponse::ok(serde_json::json!({ "args": arguments })))
    }
}

fn node(log: Arc<InMemoryConnectionLog>) -> meridian_core::info::InfoRequestRouter {
    NodeBuilder::new()
        .register(Arc::new(Pong))
        .unwrap()
        .register(Arc::new(Classified("badrequest", ErrorKind::BadRequest)))
        .unwrap()
        .register(Arc::new(Classified("internal", ErrorKind::InternalError)))
        .unwrap()
        .register(Arc::new(Classified("offline", ErrorKind::ConnectionFail)))
        .unwrap()
        .expect_capabilities(&["ping"])
        .build(log)
        .unwrap()
}

#[rstest]
#[case::ok("POST", "/info/ping/1", 200)]
#[case::wrong_method("PUT", "/info/ping", 400)]
#[case::no_name("POST", "/info/", 404)]
#[case::unknown("POST", "/info/missing", 404)]
#[case::classified_400("POST", "/info/badrequest", 400)]
#[case::classified_500("POST", "/info/internal", 500)]
#[case::sentinel("POST", "/info/offline", -1)]
#[tokio::test]
async fn each_call_leaves_exactly_one_record(
    #[case] method: &str,
    #[case] path: &str,
    #[case] expected: i32,
) {
    let log = Arc::new(InMemoryConnectionLog::new());
    let router = node(Arc::clone(&log));

    let outcome = router
        .route(&InboundRequest::new(method, path, "192.0.2.1"))
        .await;

    let status = match &outcome {
        Ok(response) => response.status(),
        Err(err) => err.status_code(),
    };
    assert_eq!(status, StatusCode::from_i32(expected));
    assert_eq!(outcome.is_err(), status.is_sentinel());

    let records = log.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].origin, "192.0.2.1");
    assert_eq!(records[0].target, path);
    assert_eq!(records[0].status.as_i32(), expected);
}

#[tokio::test]
async fn json_lines_log_writes_one_line_per_call() {
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let log = Arc::new(JsonLinesConnectionLog::with_clock(
        Vec::new(),
        Arc::new(FixedClock::new(at)),
    ));
    let router = NodeBuilder::new()
        .register(Arc::new(Pong))
        .unwrap()
        .build(log.clone())
        .unwrap();

    router
        .route(&InboundRequest::post("/info/ping", "a"))
        .await
        .unwrap();
    router
        .route(&InboundRequest::new("GET", "/info/ping", "b"))
        .await
        .unwrap();
    drop(router);

    let log = Arc::try_unwrap(log).ok().unwrap();
    let written = String::from_utf8(log.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["origin"], "a");
    assert_eq!(lines[0]["status"], 200);
    assert_eq!(lines[1]["status"], 400);
    assert_eq!(lines[1]["recorded_at"], "2026-01-02T03:04:05Z");
}
