//! InfoRequestRouter - `/info/{capability}` への呼び出しを handler に振り分ける
//!
//! 検証順（最初に当たったものが結果になる）:
//! 1. capability 名がない → 404
//! 2. メソッドが POST 以外 → 400
//! 3. 未登録の capability → 404
//! 4. handler を呼ぶ（残りのパスセグメントを引数として渡す）
//!
//! どの経路で抜けても、接続記録はちょうど 1 回書かれる（`AuditObligation` の Drop）。
//! handler の panic は 500 として記録・ログしてから呼び出し元へ再送出する。

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, warn};

use super::INFO_TARGET;
use super::registry::CapabilityRegistry;
use super::request::{InboundRequest, WRITE_METHOD};
use super::response::InfoResponse;
use crate::domain::{ErrorKind, InfoError, RequestId, StatusCode};
use crate::ports::{ConnectionAuditLog, IdGenerator, SystemClock, UlidGenerator};
use crate::processing::panic_message;

/// Obligation to write one connection record, discharged on drop.
///
/// Starts out as `UNKNOWN (0)`, so a future cancelled before it settles still
/// leaves a record behind.
struct AuditObligation<'a> {
    log: &'a dyn ConnectionAuditLog,
    origin: &'a str,
    target: &'a str,
    status: StatusCode,
}

impl<'a> AuditObligation<'a> {
    fn acquire(log: &'a dyn ConnectionAuditLog, request: &'a InboundRequest) -> Self {
        Self {
            log,
            origin: request.remote_address(),
            target: request.path(),
            status: StatusCode::UNKNOWN,
        }
    }

    fn settle(&mut self, status: StatusCode) {
        self.status = status;
    }
}

impl Drop for AuditObligation<'_> {
    fn drop(&mut self) {
        self.log.record(self.origin, self.target, self.status);
    }
}

/// Routes inbound peer calls to registered capabilities.
pub struct InfoRequestRouter {
    registry: Arc<CapabilityRegistry>,
    audit: Arc<dyn ConnectionAuditLog>,
    ids: Arc<dyn IdGenerator>,
}

impl InfoRequestRouter {
    pub fn new(registry: Arc<CapabilityRegistry>, audit: Arc<dyn ConnectionAuditLog>) -> Self {
        Self::with_id_generator(registry, audit, Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(
        registry: Arc<CapabilityRegistry>,
        audit: Arc<dyn ConnectionAuditLog>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            registry,
            audit,
            ids,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Routes one call and records its outcome.
    ///
    /// Validation failures and classified handler failures come back as
    /// `Ok` responses carrying their status code. Failures whose code is a
    /// sentinel (`-1`, `0`) and unexpected failures are returned as `Err` for
    /// the transport to answer.
    pub async fn route(&self, request: &InboundRequest) -> Result<InfoResponse, InfoError> {
        let request_id = self.ids.generate_request_id();
        let mut audit = AuditObligation::acquire(self.audit.as_ref(), request);

        let outcome = self.dispatch(request_id, request, &mut audit).await;
        let status = match &outcome {
            Ok(response) => response.status(),
            Err(err) => err.status_code(),
        };
        audit.settle(status);

        debug!(
            target: INFO_TARGET,
            request_id = %request_id,
            origin = request.remote_address(),
            path = request.path(),
            status = status.as_i32(),
            "info request routed"
        );
        outcome
    }

    async fn dispatch(
        &self,
        request_id: RequestId,
        request: &InboundRequest,
        audit: &mut AuditObligation<'_>,
    ) -> Result<InfoResponse, InfoError> {
        let target = request.target();
        let Some((name, rest)) = target.split_first() else {
            return Ok(InfoResponse::error(
                ErrorKind::NotFound,
                "no info request named in target",
            ));
        };

        if request.method() != WRITE_METHOD {
            return Ok(InfoResponse::error(
                ErrorKind::BadRequest,
                format!("{WRITE_METHOD} should be used for info calls"),
            ));
        }

        let Some(handler) = self.registry.get(name) else {
            return Ok(InfoResponse::error(
                ErrorKind::NotFound,
                format!("info request '{name}' has not been registered"),
            ));
        };

        let arguments: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
        let invoked = AssertUnwindSafe(handler.handle(request, &arguments))
            .catch_unwind()
            .await;
        match invoked {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => self.recover(request_id, request, err),
            Err(payload) => {
                audit.settle(StatusCode::INTERNAL_ERROR);
                error!(
                    target: INFO_TARGET,
                    request_id = %request_id,
                    origin = request.remote_address(),
                    path = request.path(),
                    panic = %panic_message(payload.as_ref()),
                    "info request handler panicked"
                );
                panic::resume_unwind(payload)
            }
        }
    }

    fn recover(
        &self,
        request_id: RequestId,
        request: &InboundRequest,
        err: InfoError,
    ) -> Result<InfoResponse, InfoError> {
        let status = err.status_code();
        if err.is_unexpected() {
            error!(
                target: INFO_TARGET,
                request_id = %request_id,
                origin = request.remote_address(),
                path = request.path(),
                error = %err,
                "info request failed unexpectedly"
            );
            return Err(err);
        }
        if status.is_sentinel() {
            warn!(
                target: INFO_TARGET,
                request_id = %request_id,
                origin = request.remote_address(),
                path = request.path(),
                status = status.as_i32(),
                error = %err,
                "info request failed without a protocol status"
            );
            return Err(err);
        }
        Ok(InfoResponse::from_error(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryConnectionLog;
    use crate::info::InfoRequest;
    use async_trait::async_trait;
    use std::time::Duration;

    enum Behavior {
        Echo,
        Fail(ErrorKind),
        Unexpected,
        Panic,
        Hang,
    }

    struct Scripted {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl InfoRequest for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(
            &self,
            _request: &InboundRequest,
            arguments: &[String],
        ) -> Result<InfoResponse, InfoError> {
            match self.behavior {
                Behavior::Echo => Ok(InfoResponse::ok(serde_json::json!({ "args": arguments }))),
                Behavior::Fail(kind) => Err(InfoError::new(kind, "scripted failure")),
                Behavior::Unexpected => Err(InfoError::unexpected("connection pool exhausted")),
                Behavior::Panic => panic!("handler bug"),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    fn router() -> (InfoRequestRouter, Arc<InMemoryConnectionLog>) {
        let mut registry = CapabilityRegistry::new();
        let scripted = [
            ("Ping", Behavior::Echo),
            ("forbidden", Behavior::Fail(ErrorKind::Forbidden)),
            ("unauthorized", Behavior::Fail(ErrorKind::UnauthorizedServer)),
            ("offline", Behavior::Fail(ErrorKind::ConnectionFail)),
            ("weird", Behavior::Fail(ErrorKind::Unclassified)),
            ("broken", Behavior::Unexpected),
            ("buggy", Behavior::Panic),
            ("hang", Behavior::Hang),
        ];
        for (name, behavior) in scripted {
            registry.register(Arc::new(Scripted { name, behavior })).unwrap();
        }
        let log = Arc::new(InMemoryConnectionLog::new());
        let router = InfoRequestRouter::new(Arc::new(registry), log.clone());
        (router, log)
    }

    fn recorded_statuses(log: &InMemoryConnectionLog) -> Vec<i32> {
        log.snapshot().iter().map(|r| r.status.as_i32()).collect()
    }

    #[tokio::test]
    async fn get_is_bad_request() {
        let (router, log) = router();
        let response = router
            .route(&InboundRequest::new("GET", "/info/ping", "10.0.0.9"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(recorded_statuses(&log), vec![400]);
    }

    #[tokio::test]
    async fn missing_name_is_not_found_even_for_get() {
        let (router, log) = router();
        let response = router
            .route(&InboundRequest::new("GET", "/info", "10.0.0.9"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(recorded_statuses(&log), vec![404]);
    }

    #[tokio::test]
    async fn unknown_capability_is_not_found() {
        let (router, log) = router();
        let response = router
            .route(&InboundRequest::post("/info/unknown", "10.0.0.9"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let message = response.body()["error"].as_str().unwrap();
        assert!(message.contains("not been registered"));
        assert_eq!(recorded_statuses(&log), vec![404]);
    }

    #[tokio::test]
    async fn registered_capability_gets_remaining_segments() {
        let (router, log) = router();
        let response = router
            .route(&InboundRequest::post("/info/PING/a/b", "10.0.0.9"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body()["args"], serde_json::json!(["a", "b"]));

        let records = log.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin, "10.0.0.9");
        assert_eq!(records[0].target, "/info/PING/a/b");
        assert_eq!(records[0].status, StatusCode::OK);
    }

    #[tokio::test]
    async fn classified_failures_become_responses() {
        let (router, log) = router();

        let forbidden = router
            .route(&InboundRequest::post("/info/forbidden", "a"))
            .await
            .unwrap();
        let unauthorized = router
            .route(&InboundRequest::post("/info/unauthorized", "a"))
            .await
            .unwrap();

        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(unauthorized.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(recorded_statuses(&log), vec![403, 412]);
    }

    #[tokio::test]
    async fn sentinel_failures_are_reraised() {
        let (router, log) = router();

        let offline = router
            .route(&InboundRequest::post("/info/offline", "a"))
            .await
            .unwrap_err();
        let weird = router
            .route(&InboundRequest::post("/info/weird", "a"))
            .await
            .unwrap_err();

        assert_eq!(offline.kind(), ErrorKind::ConnectionFail);
        assert_eq!(weird.kind(), ErrorKind::Unclassified);
        assert_eq!(recorded_statuses(&log), vec![-1, 0]);
    }

    #[tokio::test]
    async fn unexpected_failure_is_reraised_and_recorded_as_500() {
        let (router, log) = router();

        let err = router
            .route(&InboundRequest::post("/info/broken", "a"))
            .await
            .unwrap_err();

        assert!(err.is_unexpected());
        assert_eq!(recorded_statuses(&log), vec![500]);
    }

    #[tokio::test]
    async fn panicking_handler_is_recorded_as_500_and_rethrown() {
        let (router, log) = router();
        let router = Arc::new(router);

        let routed = tokio::spawn(async move {
            router
                .route(&InboundRequest::post("/info/buggy", "10.0.0.9"))
                .await
        })
        .await;

        assert!(routed.unwrap_err().is_panic());
        let records = log.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, StatusCode::INTERNAL_ERROR);
        assert_eq!(records[0].target, "/info/buggy");
    }

    #[tokio::test]
    async fn cancelled_request_is_still_recorded() {
        let (router, log) = router();

        let request = InboundRequest::post("/info/hang", "a");
        let result = tokio::time::timeout(Duration::from_millis(20), router.route(&request)).await;

        assert!(result.is_err());
        assert_eq!(recorded_statuses(&log), vec![0]);
    }
}
