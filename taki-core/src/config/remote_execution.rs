use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteExecution {
    /// Pool name used when a task does not name one.
    pub default_pool_name: String,

    /// Group that owns the shared executor fleet.
    pub shared_executor_pool_group_id: String,

    /// When enabled, users may register their own executors and the executor
    /// group id becomes part of the pool key.
    pub enable_user_owned_executors: bool,

    /// When enabled, executors must present credentials carrying the executor
    /// registration capability.
    pub require_executor_authorization: bool,

    /// Fleet over-subscription ratio applied to assignable executor resources
    /// when checking task fit.
    pub max_resource_capacity_ratio: f64,
}
