//! TaskHandle - 投入したタスクの結果を受け取る側
//!
//! dispatcher 側が oneshot に結果を書き、呼び出し側が `join` で読む。
//! 待つかどうかは呼び出し側の自由（handle を drop しても実行は止まらない）。

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, warn};

use super::PROCESSING_TARGET;
use crate::domain::{Criticality, TaskId};

/// Why a task did not produce a value.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(#[source] Box<dyn StdError + Send + Sync>),

    #[error("task panicked: {0}")]
    Panicked(String),

    /// Non-critical task still queued when the shutdown wait expired.
    #[error("task was abandoned during shutdown")]
    Abandoned,

    /// Submitted after the pool stopped accepting work; never executed.
    #[error("{0} pool is shut down, task was not accepted")]
    Rejected(Criticality),
}

type TaskResult<T> = Result<T, TaskError>;

/// Eventual result of a submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: TaskId,
    criticality: Criticality,
    receiver: Option<oneshot::Receiver<TaskResult<T>>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn rejected(id: TaskId, criticality: Criticality) -> Self {
        Self {
            id,
            criticality,
            receiver: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn criticality(&self) -> Criticality {
        self.criticality
    }

    /// True when the submission was a no-op because the pool had shut down.
    pub fn is_rejected(&self) -> bool {
        self.receiver.is_none()
    }

    /// Waits for the task to finish.
    pub async fn join(self) -> TaskResult<T> {
        match self.receiver {
            Some(receiver) => receiver.await.unwrap_or(Err(TaskError::Abandoned)),
            None => Err(TaskError::Rejected(self.criticality)),
        }
    }

    /// Blocking variant of [`join`](Self::join) for plain threads.
    ///
    /// # Panics
    /// Panics if called from inside an async runtime (tokio の制約).
    pub fn blocking_join(self) -> TaskResult<T> {
        match self.receiver {
            Some(receiver) => receiver.blocking_recv().unwrap_or(Err(TaskError::Abandoned)),
            None => Err(TaskError::Rejected(self.criticality)),
        }
    }
}

/// A packaged unit of work owned by a pool until it runs or is dropped.
///
/// Dropping a job without running it resolves its handle to `Abandoned`.
pub(crate) struct Job {
    id: TaskId,
    run: Box<dyn FnOnce() + Send>,
}

impl Job {
    /// Wraps `task` so that running it catches panics, logs failures by tier
    /// and completes the handle. The wrapper runs at most once.
    pub(crate) fn package<T, E, F>(
        id: TaskId,
        criticality: Criticality,
        task: F,
    ) -> (Self, TaskHandle<T>)
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let run = move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(TaskError::Failed(err.into())),
                Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
            };
            if let Err(err) = &result {
                report_failure(id, criticality, err);
            }
            // handle が drop 済みでも問題ない
            let _ = sender.send(result);
        };
        let job = Self {
            id,
            run: Box::new(run),
        };
        let handle = TaskHandle {
            id,
            criticality,
            receiver: Some(receiver),
        };
        (job, handle)
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn run(self) {
        (self.run)()
    }
}

fn report_failure(id: TaskId, criticality: Criticality, err: &TaskError) {
    let task_id = id.to_string();
    match criticality {
        // critical の失敗はデータ欠損の可能性が高い
        Criticality::Critical => error!(
            target: PROCESSING_TARGET,
            %task_id,
            tier = criticality.as_str(),
            error = %err,
            "critical task failed"
        ),
        Criticality::NonCritical => warn!(
            target: PROCESSING_TARGET,
            %task_id,
            tier = criticality.as_str(),
            error = %err,
            "non-critical task failed"
        ),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
