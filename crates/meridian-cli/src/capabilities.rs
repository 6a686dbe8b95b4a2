//! Demo capabilities served by the node.
//!
//! - `ping`: 即答
//! - `generatepage/{n}`: ページ生成を non-critical プールに回す
//! - `storesession`: セッション保存を critical プールに回す（既知のサーバーからのみ）

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use meridian_core::domain::InfoError;
use meridian_core::info::{InboundRequest, InfoRequest, InfoResponse};
use meridian_core::processing::{TaskDispatcher, TaskError};

fn task_failure(err: TaskError) -> InfoError {
    match err {
        TaskError::Rejected(tier) => {
            InfoError::internal(format!("{tier} processing is shutting down"))
        }
        other => InfoError::unexpected(other),
    }
}

pub struct PingRequest;

#[async_trait]
impl InfoRequest for PingRequest {
    fn name(&self) -> &str {
        "Ping"
    }

    async fn handle(
        &self,
        _request: &InboundRequest,
        _arguments: &[String],
    ) -> Result<InfoResponse, InfoError> {
        Ok(InfoResponse::ok(json!("pong")))
    }
}

pub struct GeneratePageRequest {
    dispatcher: Arc<TaskDispatcher>,
}

impl GeneratePageRequest {
    pub fn new(dispatcher: Arc<TaskDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl InfoRequest for GeneratePageRequest {
    fn name(&self) -> &str {
        "GeneratePage"
    }

    async fn handle(
        &self,
        _request: &InboundRequest,
        arguments: &[String],
    ) -> Result<InfoResponse, InfoError> {
        let page: u32 = arguments
            .first()
            .ok_or_else(|| InfoError::bad_request("page number is required"))?
            .parse()
            .map_err(|_| InfoError::bad_request("page number must be a positive integer"))?;

        let handle = self
            .dispatcher
            .submit_non_critical(move || Ok::<_, String>(format!("<html><body>page {page}</body></html>")));
        let html = handle.join().await.map_err(task_failure)?;
        Ok(InfoResponse::ok(json!({ "page": page, "bytes": html.len() })))
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    session_id: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// In-memory session table standing in for the database.
pub type SessionStore = Arc<Mutex<HashMap<String, serde_json::Value>>>;

pub struct StoreSessionRequest {
    dispatcher: Arc<TaskDispatcher>,
    store: SessionStore,
    known_servers: BTreeSet<String>,
}

impl StoreSessionRequest {
    pub fn new(
        dispatcher: Arc<TaskDispatcher>,
        store: SessionStore,
        known_servers: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            known_servers: known_servers.into_iter().collect(),
        }
    }
}

#[async_trait]
impl InfoRequest for StoreSessionRequest {
    fn name(&self) -> &str {
        "StoreSession"
    }

    async fn handle(
        &self,
        request: &InboundRequest,
        _arguments: &[String],
    ) -> Result<InfoResponse, InfoError> {
        if !self.known_servers.contains(request.remote_address()) {
            return Err(InfoError::unauthorized_server(format!(
                "{} is not a known server",
                request.remote_address()
            )));
        }
        let payload: SessionPayload = serde_json::from_value(request.body().clone())
            .map_err(|e| InfoError::bad_request(format!("invalid session payload: {e}")))?;

        let store = Arc::clone(&self.store);
        let session_id = payload.session_id.clone();
        let handle = self.dispatcher.submit_critical(move || {
            let mut sessions = store.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.insert(payload.session_id, payload.data);
            Ok::<_, String>(sessions.len())
        });
        let stored = handle.join().await.map_err(task_failure)?;
        Ok(InfoResponse::ok(json!({ "session_id": session_id, "sessions": stored })))
    }
}
