use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taki_core::types;
use taki_rpc::proto::scheduler::SchedulingMetadata;

/// Decoded view of a task row returned by the store.
#[derive(Clone, Debug)]
pub struct PersistedTask {
    pub task_id: String,
    pub metadata: SchedulingMetadata,
    pub serialized_task: Vec<u8>,
    pub queued_timestamp: DateTime<Utc>,
    pub attempt_count: i64,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Writes a new task row and applies the task TTL. Fails with
    /// `AlreadyExists` if a row with this id is already present.
    async fn insert(
        &self,
        task_id: &str,
        metadata: &SchedulingMetadata,
        serialized_task: &[u8],
    ) -> types::Result<()>;

    async fn read(&self, task_id: &str) -> types::Result<PersistedTask>;

    /// Reads a batch of tasks, skipping entries that are already gone.
    async fn read_many(&self, task_ids: &[String]) -> types::Result<Vec<PersistedTask>>;

    /// Acquires the claim on a task and increments its attempt count. Fails
    /// with `NotFound` when someone else holds the claim or the task is gone.
    async fn claim(&self, task_id: &str) -> types::Result<()>;

    /// Releases the claim on a task. Fails with `NotFound` when the task is
    /// not currently claimed.
    async fn unclaim(&self, task_id: &str) -> types::Result<()>;

    /// Deletes a task that is currently claimed. Fails with `NotFound` when
    /// the task is not claimed.
    async fn delete_claimed(&self, task_id: &str) -> types::Result<()>;
}
