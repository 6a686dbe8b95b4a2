//! TaskDispatcher - critical / non-critical の二層ワーカープール
//!
//! # シャットダウン手順（`disable`）
//! 1. 両方のプールで新規受付を止める（critical は queued をまとめて回収）
//! 2. critical: 回収したタスクを呼び出しスレッドで 1 つずつ同期実行
//! 3. non-critical: `drain_timeout` まで終了を待ち、残りは破棄
//! 4. critical: 実行中だったタスクは worker の join で完了を待つ
//! 5. 回収数をログに出して ShutdownReport を返す

use std::error::Error as StdError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::PROCESSING_TARGET;
use super::config::DispatcherConfig;
use super::handle::{Job, TaskHandle};
use super::pool::WorkerPool;
use crate::domain::Criticality;
use crate::ports::{IdGenerator, SystemClock, UlidGenerator};

/// Dispatcher setup failures.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0} pool must have at least one worker")]
    EmptyPool(Criticality),

    #[error("failed to spawn {tier} worker threads: {source}")]
    Spawn {
        tier: Criticality,
        #[source]
        source: std::io::Error,
    },

    /// Reuse after `disable()`; pools cannot be restarted.
    #[error("{0} pool was shut down before enable")]
    PoolShutDown(Criticality),
}

/// What `disable()` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Queued critical tasks executed on the disabling thread.
    pub drained_critical: usize,
    /// Queued non-critical tasks dropped after the bounded wait.
    pub abandoned_non_critical: usize,
    /// Whether the non-critical pool failed to finish within the wait.
    pub non_critical_timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    Running,
    Disabled,
}

/// Two independent worker pools plus the shutdown protocol that ties them
/// together.
pub struct TaskDispatcher {
    config: DispatcherConfig,
    critical: WorkerPool,
    non_critical: WorkerPool,
    ids: Arc<dyn IdGenerator>,
    disabled: AtomicBool,
}

impl TaskDispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, SetupError> {
        Self::with_id_generator(config, Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(
        config: DispatcherConfig,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let critical = spawn_pool(&config, Criticality::Critical)?;
        let non_critical = spawn_pool(&config, Criticality::NonCritical)?;
        Ok(Self {
            config,
            critical,
            non_critical,
            ids,
            disabled: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn pool(&self, criticality: Criticality) -> &WorkerPool {
        match criticality {
            Criticality::Critical => &self.critical,
            Criticality::NonCritical => &self.non_critical,
        }
    }

    /// Verifies both pools are usable. Fails if either was already shut down.
    pub fn enable(&self) -> Result<(), SetupError> {
        for tier in [Criticality::NonCritical, Criticality::Critical] {
            if self.pool(tier).is_shut_down() {
                return Err(SetupError::PoolShutDown(tier));
            }
        }
        info!(
            target: PROCESSING_TARGET,
            critical_workers = self.config.critical_workers,
            non_critical_workers = self.config.non_critical_workers,
            "processing enabled"
        );
        Ok(())
    }

    /// Queues `task` on the pool for `criticality`.
    ///
    /// After shutdown has begun this is a no-op: the closure is dropped
    /// without running and the returned handle reports `Rejected`.
    pub fn submit<T, E, F>(&self, criticality: Criticality, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let id = self.ids.generate_task_id();
        let (job, handle) = Job::package(id, criticality, task);
        match self.pool(criticality).submit(job) {
            Ok(()) => handle,
            Err(_unrun) => {
                debug!(
                    target: PROCESSING_TARGET,
                    task_id = %id,
                    tier = criticality.as_str(),
                    "pool is shut down, task ignored"
                );
                TaskHandle::rejected(id, criticality)
            }
        }
    }

    pub fn submit_critical<T, E, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.submit(Criticality::Critical, task)
    }

    pub fn submit_non_critical<T, E, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.submit(Criticality::NonCritical, task)
    }

    /// Number of queued (not yet started) tasks in one pool.
    pub fn pending(&self, criticality: Criticality) -> usize {
        self.pool(criticality).pending()
    }

    pub fn state(&self) -> DispatcherState {
        if self.disabled.load(Ordering::SeqCst) {
            DispatcherState::Disabled
        } else {
            DispatcherState::Running
        }
    }

    /// Runs the shutdown protocol. Blocks until every critical task that was
    /// queued or running has finished. Later calls return an empty report.
    pub fn disable(&self) -> ShutdownReport {
        if self.disabled.swap(true, Ordering::SeqCst) {
            debug!(target: PROCESSING_TARGET, "processing already disabled");
            return ShutdownReport::default();
        }

        // 1. ここ以降の submit はすべて no-op
        self.non_critical.shutdown();
        let drained = self.critical.shutdown_now();

        // 2. critical は呼び出しスレッドで同期実行（失敗は Job 単位で閉じ込める）
        let mut report = ShutdownReport {
            drained_critical: drained.len(),
            ..ShutdownReport::default()
        };
        for job in drained {
            job.run();
        }

        // 3. non-critical は待てるだけ待つ
        if self
            .non_critical
            .await_termination(self.config.drain_timeout())
        {
            self.non_critical.join_workers();
        } else {
            let abandoned = self.non_critical.shutdown_now();
            for job in &abandoned {
                debug!(
                    target: PROCESSING_TARGET,
                    task_id = %job.id(),
                    "abandoning non-critical task"
                );
            }
            report.non_critical_timed_out = true;
            report.abandoned_non_critical = abandoned.len();
            // 実行中の non-critical は待たずに切り離す
            self.non_critical.detach_workers();
        }

        // 4. 実行中だった critical の完了を待つ
        self.critical.join_workers();

        info!(
            target: PROCESSING_TARGET,
            drained_critical = report.drained_critical,
            abandoned_non_critical = report.abandoned_non_critical,
            non_critical_timed_out = report.non_critical_timed_out,
            "processing disabled"
        );
        report
    }
}

fn spawn_pool(config: &DispatcherConfig, tier: Criticality) -> Result<WorkerPool, SetupError> {
    WorkerPool::spawn(tier, config.workers(tier), &config.thread_name_prefix)
        .map_err(|source| SetupError::Spawn { tier, source })
}
