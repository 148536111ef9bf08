use std::time::Duration;

pub const LEASE_INTERVAL: Duration = Duration::from_secs(10);
pub const LEASE_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Deadline for the re-enqueue triggered when a lease stream ends with the
/// task still claimed. The stream context is already gone at that point.
pub const LEASE_FINALIZATION_TIMEOUT: Duration = Duration::from_secs(3);

/// How many reservations get enqueued across executor nodes for each task.
/// Executors work on tasks as they fit into available RAM, so a third probe
/// buys a slightly higher chance of prompt completion at the cost of slightly
/// more network traffic and queueing latency.
pub const PROBES_PER_TASK: usize = 3;

/// How stale the cached set of execution nodes may be. A pool whose last
/// fetch is older than this gets re-fetched before the next enqueue.
pub const MAX_ALLOWED_EXECUTION_NODES_STALENESS: Duration = Duration::from_secs(10);

/// The maximum number of times a task may be re-enqueued.
pub const MAX_TASK_ATTEMPT_COUNT: i64 = 5;

/// Number of unclaimed tasks to try to assign to a node that newly joined.
pub const TASKS_TO_ENQUEUE_ON_JOIN: usize = 20;

/// Maximum task TTL in the KV store.
pub const TASK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Maximum number of unclaimed task IDs tracked per pool.
pub const MAX_UNCLAIMED_TASKS_TRACKED: i64 = 10_000;

/// TTL for the per-pool unclaimed task sets. Extended when tasks are added.
pub const UNCLAIMED_TASK_SET_TTL: Duration = Duration::from_secs(60 * 60);

pub const UNUSED_SCHEDULER_CLIENT_EXPIRATION: Duration = Duration::from_secs(5 * 60);
pub const UNUSED_SCHEDULER_CLIENT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Timeout for an EnqueueTaskReservation RPC to a different scheduler.
pub const SCHEDULER_ENQUEUE_TASK_RESERVATION_TIMEOUT: Duration = Duration::from_secs(3);
pub const SCHEDULER_ENQUEUE_TASK_RESERVATION_FAILURE_SLEEP: Duration = Duration::from_secs(1);

pub const REMOVE_EXECUTOR_CLEANUP_TIMEOUT: Duration = Duration::from_secs(15);

/// How often credentials are revalidated for an open registration stream.
pub const CHECK_REGISTRATION_CREDENTIALS_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(strum_macros::Display)]
pub enum KeyPrefix {
    #[strum(serialize = "task")]
    Task,

    #[strum(serialize = "executorPool")]
    ExecutorPool,

    #[strum(serialize = "unclaimedTasks")]
    UnclaimedTasks,

    #[strum(serialize = "executorPools")]
    ExecutorPools,
}
