//! WorkerPool - 固定サイズのスレッドプール
//!
//! # 実装詳細
//! - VecDeque<Job> を Mutex で保護し、Condvar で worker を起こす
//! - `accepting == false` かつキューが空になったら worker は終了する
//! - 最後の worker が抜けるときに `terminated` を通知する
//!
//! ロックを持ったまま Job を実行しないこと（実行は必ずロックの外）。

use std::collections::VecDeque;
use std::io;
use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use super::PROCESSING_TARGET;
use super::handle::Job;
use crate::domain::Criticality;

struct PoolState {
    queue: VecDeque<Job>,
    accepting: bool,
    live_workers: usize,
}

struct PoolShared {
    tier: Criticality,
    state: Mutex<PoolState>,
    /// push / shutdown 時の通知
    available: Condvar,
    /// 最後の worker が終了したときの通知
    terminated: Condvar,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-size pool of named OS threads serving one criticality tier.
pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `size` workers named `{prefix} {tier}-pool-{n}`.
    pub(crate) fn spawn(tier: Criticality, size: usize, prefix: &str) -> io::Result<Self> {
        let shared = Arc::new(PoolShared {
            tier,
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                accepting: true,
                live_workers: size,
            }),
            available: Condvar::new(),
            terminated: Condvar::new(),
        });

        let pool = Self {
            shared: Arc::clone(&shared),
            workers: Mutex::new(Vec::with_capacity(size)),
        };
        for n in 0..size {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("{prefix} {tier}-pool-{n}"))
                .spawn(move || worker_loop(worker_shared));
            match spawned {
                Ok(join) => pool.lock_workers().push(join),
                Err(err) => {
                    // 起動済みの worker を止めてから返す
                    pool.account_unspawned(size - n);
                    pool.shutdown();
                    pool.join_workers();
                    return Err(err);
                }
            }
        }
        Ok(pool)
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn account_unspawned(&self, missing: usize) {
        let mut state = self.shared.lock();
        state.live_workers -= missing;
    }

    /// Enqueues a job, or hands it back if the pool stopped accepting work.
    pub(crate) fn submit(&self, job: Job) -> Result<(), Job> {
        let mut state = self.shared.lock();
        if !state.accepting {
            return Err(job);
        }
        state.queue.push_back(job);
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        !self.shared.lock().accepting
    }

    pub(crate) fn pending(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Stops accepting work; queued jobs are still run by the workers.
    /// Returns false if the pool was already shut down.
    pub(crate) fn shutdown(&self) -> bool {
        let mut state = self.shared.lock();
        let was_accepting = mem::replace(&mut state.accepting, false);
        drop(state);
        self.shared.available.notify_all();
        was_accepting
    }

    /// Stops accepting work and removes every queued job in one step, so no
    /// worker can pick up a job after this returns.
    pub(crate) fn shutdown_now(&self) -> Vec<Job> {
        let mut state = self.shared.lock();
        state.accepting = false;
        let queued: Vec<Job> = state.queue.drain(..).collect();
        drop(state);
        self.shared.available.notify_all();
        queued
    }

    /// Waits until every worker has exited, or `timeout` elapses.
    /// Returns true if the pool terminated in time.
    pub(crate) fn await_termination(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .terminated
            .wait_timeout_while(state, timeout, |state| state.live_workers > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.live_workers == 0
    }

    /// Joins every worker thread. Blocks until in-flight jobs finish.
    pub(crate) fn join_workers(&self) {
        let workers = mem::take(&mut *self.lock_workers());
        for worker in workers {
            // Job は catch_unwind 済みなので worker 自体は panic しない
            let _ = worker.join();
        }
    }

    /// Lets still-running workers finish on their own without waiting.
    pub(crate) fn detach_workers(&self) {
        self.lock_workers().clear();
    }
}

impl Drop for WorkerPool {
    // disable() なしで drop された場合: worker はキューを捌いてから終了する
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let next = {
            let mut state = shared.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break Some(job);
                }
                if !state.accepting {
                    break None;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        let Some(job) = next else {
            break;
        };
        trace!(
            target: PROCESSING_TARGET,
            task_id = %job.id(),
            tier = shared.tier.as_str(),
            "running task"
        );
        job.run();
    }

    let mut state = shared.lock();
    state.live_workers -= 1;
    if state.live_workers == 0 {
        shared.terminated.notify_all();
    }
}
