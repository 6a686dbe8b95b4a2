//! Processing - 呼び出し元スレッドから切り離して作業を実行する
//!
//! 2 つの独立したワーカープールを持ちます。
//! - **critical**（既定 2 本）: シャットダウン中でも必ず試行される作業（DB 書き込みなど）
//! - **non-critical**（既定 6 本）: 破棄してよい作業（ページ生成、キャッシュの温め）
//!
//! タスク内の失敗は `TaskHandle` に閉じ込められ、他のタスクには波及しません。
//! non-critical の失敗は `warn`、critical の失敗は `error` でログに出ます。
//!
//! ```ignore
//! let dispatcher = TaskDispatcher::new(DispatcherConfig::default())?;
//! dispatcher.enable()?;
//! let handle = dispatcher.submit_critical(move || store.save(session));
//! // ...
//! let report = dispatcher.disable();
//! ```

mod config;
mod dispatcher;
mod handle;
mod pool;

pub use self::config::DispatcherConfig;
pub use self::dispatcher::{DispatcherState, SetupError, ShutdownReport, TaskDispatcher};
pub use self::handle::{TaskError, TaskHandle};
pub(crate) use self::handle::panic_message;

/// Tracing target for dispatcher activity.
pub(crate) const PROCESSING_TARGET: &str = "meridian_core::processing";
