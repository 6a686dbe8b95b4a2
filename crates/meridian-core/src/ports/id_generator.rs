//! IdGenerator port - ID 生成の抽象化
//!
//! Clock の現在時刻を timestamp 部分に、rand の乱数を残りに使って ULID を作ります。

use crate::domain::ids::{RequestId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// Generates task and request ids.
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_request_id(&self) -> RequestId;
}

/// ULID generator driven by a [`Clock`].
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_request_id(&self) -> RequestId {
        RequestId::from(self.next_ulid())
    }
}
