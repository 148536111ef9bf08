use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rand::seq::SliceRandom;
use taki_core::errors::Error;
use taki_core::types;
use taki_kv::SharedKv;
use taki_rpc::proto::scheduler::{RegisteredExecutionNode, SchedulingMetadata, TaskSize};
use tokio::sync::Mutex;

use crate::constant::{self, KeyPrefix};
use crate::executor::ExecutorHandle;

/// Routing bucket for executors: `{group, os, arch, pool}`. The group id is
/// empty when user-owned executors are disabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub group_id: String,
    pub os: String,
    pub arch: String,
    pub pool: String,
}

impl PoolKey {
    pub fn from_metadata(metadata: &SchedulingMetadata) -> Self {
        Self {
            group_id: metadata.executor_group_id.clone(),
            os: metadata.os.clone(),
            arch: metadata.arch.clone(),
            pool: metadata.pool.clone(),
        }
    }

    fn key_suffix(&self) -> String {
        let mut key = String::new();
        if !self.group_id.is_empty() {
            key.push_str(&self.group_id);
            key.push('-');
        }
        format!("{}{}-{}-{}", key, self.os, self.arch, self.pool)
    }

    pub fn pool_hash_key(&self) -> String {
        format!("{}/{}", KeyPrefix::ExecutorPool, self.key_suffix())
    }

    pub fn unclaimed_tasks_key(&self) -> String {
        format!("{}/{}", KeyPrefix::UnclaimedTasks, self.key_suffix())
    }
}

/// One executor as seen by the dispatcher: either a cached entry from the KV
/// pool hash, or a locally connected stream carrying a dispatch handle.
#[derive(Clone)]
pub struct ExecutionNode {
    pub executor_id: String,
    pub assignable_memory_bytes: i64,
    pub assignable_milli_cpu: i64,
    /// host:port of the scheduler the executor is streaming to. Unset for
    /// locally connected entries.
    pub scheduler_host_port: Option<String>,
    pub handle: Option<Arc<dyn ExecutorHandle>>,
}

impl ExecutionNode {
    pub fn scheduler_uri(&self) -> Option<String> {
        match self.scheduler_host_port.as_deref() {
            Some(host_port) if !host_port.is_empty() => Some(format!("http://{}", host_port)),
            _ => None,
        }
    }

    fn fits(&self, task_size: &TaskSize, capacity_ratio: f64) -> bool {
        (self.assignable_memory_bytes as f64 * capacity_ratio) as i64
            >= task_size.estimated_memory_bytes
            && (self.assignable_milli_cpu as f64 * capacity_ratio) as i64
                >= task_size.estimated_milli_cpu
    }
}

impl fmt::Display for ExecutionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.handle.is_some() {
            write!(f, "connected executor({})", self.executor_id)
        } else {
            write!(
                f,
                "executor({}) @ scheduler({})",
                self.executor_id,
                self.scheduler_host_port.as_deref().unwrap_or("")
            )
        }
    }
}

#[derive(Default)]
struct PoolState {
    last_fetch: Option<Instant>,
    nodes: Vec<ExecutionNode>,
    /// Executors connected to this scheduler process.
    connected_executors: Vec<ExecutionNode>,
}

/// Per-pool-key view of the fleet: the cached cross-scheduler executor list,
/// the locally connected executors, and the pool's unclaimed-task set.
pub struct NodePool {
    kv: SharedKv,
    key: PoolKey,
    state: Mutex<PoolState>,
}

impl NodePool {
    pub fn new(kv: SharedKv, key: PoolKey) -> Self {
        Self {
            kv,
            key,
            state: Mutex::new(PoolState::default()),
        }
    }

    async fn fetch_execution_nodes(&self) -> types::Result<Vec<ExecutionNode>> {
        let entries = self.kv.hget_all(&self.key.pool_hash_key()).await?;

        let mut executors = Vec::with_capacity(entries.len());
        for (executor_id, data) in entries {
            let node = RegisteredExecutionNode::decode_bytes(&data).map_err(Error::unknown)?;
            let registration = node.registration.unwrap_or_default();
            executors.push(ExecutionNode {
                executor_id,
                assignable_memory_bytes: registration.assignable_memory_bytes,
                assignable_milli_cpu: registration.assignable_milli_cpu,
                scheduler_host_port: Some(node.scheduler_host_port),
                handle: None,
            });
        }

        Ok(executors)
    }

    /// Re-reads the pool hash unless the cached list is fresh and non-empty.
    pub async fn refresh(&self) -> types::Result<()> {
        let mut state = self.state.lock().await;

        if let Some(last_fetch) = state.last_fetch {
            if last_fetch.elapsed() < constant::MAX_ALLOWED_EXECUTION_NODES_STALENESS
                && !state.nodes.is_empty()
            {
                return Ok(());
            }
        }

        let nodes = self.fetch_execution_nodes().await?;
        state.nodes = nodes;
        state.last_fetch = Some(Instant::now());

        Ok(())
    }

    /// Counts executors whose oversubscribed capacity covers the task size.
    pub async fn fit_count(&self, task_size: &TaskSize, capacity_ratio: f64) -> types::Result<usize> {
        self.refresh().await?;

        let state = self.state.lock().await;
        if state.nodes.is_empty() {
            return Err(Error::unavailable(format!(
                "no registered executors in pool '{}' with os '{}' with arch '{}'",
                self.key.pool, self.key.os, self.key.arch
            )));
        }

        let fit_count = state
            .nodes
            .iter()
            .filter(|node| node.fits(task_size, capacity_ratio))
            .count();

        if fit_count == 0 {
            return Err(Error::unavailable(format!(
                "no registered executors in pool '{}' with os '{}' with arch '{}' can fit a task with {} milli-cpu and {} bytes of memory",
                self.key.pool,
                self.key.os,
                self.key.arch,
                task_size.estimated_milli_cpu,
                task_size.estimated_memory_bytes
            )));
        }

        Ok(fit_count)
    }

    /// Snapshot of the dispatch candidates: the locally connected executors,
    /// or the whole cached pool.
    pub async fn candidate_nodes(&self, connected_only: bool) -> Vec<ExecutionNode> {
        let state = self.state.lock().await;
        if connected_only {
            state.connected_executors.clone()
        } else {
            state.nodes.clone()
        }
    }

    /// Returns false when an executor with this id is already connected.
    pub async fn add_connected_executor(&self, node: ExecutionNode) -> bool {
        let mut state = self.state.lock().await;
        if state
            .connected_executors
            .iter()
            .any(|e| e.executor_id == node.executor_id)
        {
            return false;
        }
        state.connected_executors.push(node);
        true
    }

    pub async fn remove_connected_executor(&self, executor_id: &str) -> bool {
        let mut state = self.state.lock().await;
        match state
            .connected_executors
            .iter()
            .position(|e| e.executor_id == executor_id)
        {
            Some(index) => {
                state.connected_executors.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub async fn find_connected_executor(&self, executor_id: &str) -> Option<ExecutionNode> {
        if executor_id.is_empty() {
            return None;
        }
        let state = self.state.lock().await;
        state
            .connected_executors
            .iter()
            .find(|e| e.executor_id == executor_id)
            .cloned()
    }

    pub async fn add_unclaimed_task(&self, task_id: &str) -> types::Result<()> {
        let key = self.key.unclaimed_tasks_key();
        self.kv
            .zadd(&key, task_id, Utc::now().timestamp() as f64)
            .await?;
        self.kv
            .expire(&key, constant::UNCLAIMED_TASK_SET_TTL)
            .await?;

        // The trim is not atomic with the insert; an oversized set between
        // the two commands is fine.
        let n = self.kv.zcard(&key).await?;
        if n > constant::MAX_UNCLAIMED_TASKS_TRACKED {
            // The score is the insertion timestamp, so the oldest task sits
            // at rank 0. The indexes are inclusive.
            return self
                .kv
                .zrem_range_by_rank(&key, 0, n - constant::MAX_UNCLAIMED_TASKS_TRACKED - 1)
                .await;
        }

        Ok(())
    }

    pub async fn remove_unclaimed_task(&self, task_id: &str) -> types::Result<()> {
        self.kv
            .zrem(&self.key.unclaimed_tasks_key(), task_id)
            .await
    }

    /// Random sample (without replacement) of up to `n` unclaimed task IDs.
    /// The sample is taken client-side rather than with a random-member
    /// command, which not every KV server version offers.
    pub async fn sample_unclaimed_tasks(&self, n: usize) -> types::Result<Vec<String>> {
        let mut unclaimed = self
            .kv
            .zrange_all(&self.key.unclaimed_tasks_key())
            .await?;

        unclaimed.shuffle(&mut rand::thread_rng());
        unclaimed.truncate(n);

        Ok(unclaimed)
    }
}
