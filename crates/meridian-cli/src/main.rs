//! meridian - demo node
//!
//! 1. 設定を読み、telemetry を初期化
//! 2. TaskDispatcher を起動し、capability を登録して Router を組み立てる
//! 3. 台本どおりの info request を流す
//! 4. 接続記録と ShutdownReport を JSON で出力

mod capabilities;
mod telemetry;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use meridian_core::app::{BuildError, ConfigError, LogFormat, NodeBuilder, NodeConfig};
use meridian_core::impls::InMemoryConnectionLog;
use meridian_core::info::{InboundRequest, RegistryError};
use meridian_core::processing::{SetupError, TaskDispatcher};

use crate::capabilities::{GeneratePageRequest, PingRequest, StoreSessionRequest};
use crate::telemetry::TelemetryError;

const KNOWN_SERVER: &str = "10.0.0.2";

/// Runs a scripted batch of info requests against an in-process node.
#[derive(Parser, Debug)]
#[command(name = "meridian", version)]
struct Cli {
    /// JSON config file. Defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides `telemetry.log_filter` (e.g. `debug,meridian_core::info=trace`).
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,
    /// Emit logs as JSON instead of the compact format.
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("shutdown task failed: {0}")]
    Shutdown(#[from] tokio::task::JoinError),
}

fn script() -> Vec<InboundRequest> {
    vec![
        InboundRequest::post("/info/ping", "10.0.0.7"),
        InboundRequest::new("GET", "/info/ping", "10.0.0.7"),
        InboundRequest::post("/info", "10.0.0.7"),
        InboundRequest::post("/info/reindex", "10.0.0.7"),
        InboundRequest::post("/info/GeneratePage/42", "10.0.0.7"),
        InboundRequest::post("/info/generatepage/front", "10.0.0.7"),
        InboundRequest::post("/info/storesession", KNOWN_SERVER)
            .with_body(json!({ "session_id": "s-1", "data": { "user": "ann" } })),
        InboundRequest::post("/info/storesession", KNOWN_SERVER).with_body(json!({ "data": 1 })),
        InboundRequest::post("/info/storesession", "203.0.113.9")
            .with_body(json!({ "session_id": "s-2" })),
    ]
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let mut config = NodeConfig::load_or_default(cli.config.as_deref())?;
    if let Some(filter) = cli.log_filter {
        config.telemetry.log_filter = filter;
    }
    if cli.json_logs {
        config.telemetry.log_format = LogFormat::Json;
    }
    telemetry::initialise(&config.telemetry)?;

    let dispatcher = Arc::new(TaskDispatcher::new(config.dispatcher.clone())?);
    dispatcher.enable()?;

    let sessions = Arc::new(Mutex::new(HashMap::new()));
    let audit = Arc::new(InMemoryConnectionLog::new());
    let router = NodeBuilder::new()
        .register(Arc::new(PingRequest))?
        .register(Arc::new(GeneratePageRequest::new(Arc::clone(&dispatcher))))?
        .register(Arc::new(StoreSessionRequest::new(
            Arc::clone(&dispatcher),
            Arc::clone(&sessions),
            [KNOWN_SERVER.to_string()],
        )))?
        .expect_capabilities(&["ping", "generatepage", "storesession"])
        .build(audit.clone())?;
    info!(capabilities = ?router.registry().names(), "node ready");

    for request in script() {
        match router.route(&request).await {
            Ok(response) => println!(
                "{}",
                serde_json::to_string(&json!({
                    "path": request.path(),
                    "status": response.status(),
                    "body": response.body(),
                }))?
            ),
            Err(err) => error!(path = request.path(), error = %err, "call was not answered"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&audit.snapshot())?);

    // disable() はブロックするので runtime のスレッドでは呼ばない
    let shutdown = Arc::clone(&dispatcher);
    let report = tokio::task::spawn_blocking(move || shutdown.disable()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("meridian: {err}");
            ExitCode::FAILURE
        }
    }
}
