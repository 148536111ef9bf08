use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use taki_core::config::Config;
use taki_core::errors::Error;
use taki_core::types;
use taki_kv::SharedKv;
use taki_rpc::model::scheduler::extract_routing_props;
use taki_rpc::proto;
use taki_rpc::proto::scheduler::{
    EnqueueTaskReservationRequest, EnqueueTaskReservationResponse, GetExecutionNodesRequest,
    GetExecutionNodesResponse, ReEnqueueTaskRequest, ReEnqueueTaskResponse, ScheduleTaskRequest,
    ScheduleTaskResponse,
};
use tokio::sync::watch;
use tonic::metadata::MetadataMap;

use crate::auth::{Authenticator, Capability};
use crate::constant::{self, KeyPrefix};
use crate::metric;
use crate::peer::SchedulerClientCache;
use crate::pool::{ExecutionNode, NodePool, PoolKey};
use crate::router::TaskRouter;
use crate::task_store;

/// Options for overriding server behavior needed for testing.
#[derive(Clone, Debug, Default)]
pub struct SchedulerOptions {
    pub local_hostname_override: Option<String>,
    pub local_port_override: Option<u16>,
    pub require_executor_authorization: bool,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct EnqueueTaskReservationOpts {
    pub num_replicas: usize,
    /// Zero means unbounded.
    pub max_attempts: usize,
    /// Probe only executors connected to this scheduler process instead of
    /// the whole pool.
    pub scheduler_local: bool,
}

/// The scheduler core: accepts task submissions, persists them in the shared
/// KV store, and fans reservation probes out across the executor fleet.
/// Cheap to clone; all state lives behind shared handles.
#[derive(Clone)]
pub struct SchedulerServer {
    pub(crate) kv: SharedKv,
    pub(crate) task_store: task_store::Repository,
    pub(crate) task_router: Arc<dyn TaskRouter>,
    pub(crate) authenticator: Option<Arc<dyn Authenticator>>,
    pub(crate) client_cache: SchedulerClientCache,
    pub(crate) shutdown: watch::Receiver<bool>,
    /// host:port at which this scheduler can be reached.
    pub(crate) own_host_port: String,
    pub(crate) default_pool_name: String,
    pub(crate) shared_executor_pool_group_id: String,
    pub(crate) enable_user_owned_executors: bool,
    pub(crate) require_executor_authorization: bool,
    pub(crate) max_resource_capacity_ratio: f64,
    pools: Arc<RwLock<HashMap<PoolKey, Arc<NodePool>>>>,
}

impl SchedulerServer {
    pub fn new(
        kv: Option<SharedKv>,
        task_router: Option<Arc<dyn TaskRouter>>,
        authenticator: Option<Arc<dyn Authenticator>>,
        config: &Config,
        options: SchedulerOptions,
        shutdown: watch::Receiver<bool>,
    ) -> types::Result<Self> {
        let kv = kv.ok_or_else(|| {
            Error::failed_precondition("a KV store is required for remote execution")
        })?;
        let task_router =
            task_router.ok_or_else(|| Error::failed_precondition("missing task router"))?;

        let remote_execution = &config.remote_execution;
        let require_executor_authorization =
            remote_execution.require_executor_authorization || options.require_executor_authorization;

        let own_hostname = options
            .local_hostname_override
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "localhost".to_string());
        let own_port = options.local_port_override.unwrap_or(config.api.rpc_port);

        Ok(Self {
            task_store: task_store::service::Service::new(kv.clone()),
            kv,
            task_router,
            authenticator,
            client_cache: SchedulerClientCache::new(),
            shutdown,
            own_host_port: format!("{}:{}", own_hostname, own_port),
            default_pool_name: remote_execution.default_pool_name.clone(),
            shared_executor_pool_group_id: remote_execution.shared_executor_pool_group_id.clone(),
            enable_user_owned_executors: remote_execution.enable_user_owned_executors,
            require_executor_authorization,
            max_resource_capacity_ratio: remote_execution.max_resource_capacity_ratio,
            pools: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn task_store(&self) -> task_store::Repository {
        self.task_store.clone()
    }

    pub fn get_pool(&self, key: &PoolKey) -> Option<Arc<NodePool>> {
        self.pools.read().unwrap().get(key).cloned()
    }

    pub fn get_or_create_pool(&self, key: &PoolKey) -> Arc<NodePool> {
        if let Some(pool) = self.get_pool(key) {
            return pool;
        }

        let mut pools = self.pools.write().unwrap();
        if let Some(pool) = pools.get(key) {
            return pool.clone();
        }
        let pool = Arc::new(NodePool::new(self.kv.clone(), key.clone()));
        pools.insert(key.clone(), pool.clone());
        pool
    }

    pub(crate) fn executor_pools_key(&self, group_id: &str) -> String {
        let mut key = format!("{}/", KeyPrefix::ExecutorPools);
        if self.enable_user_owned_executors {
            key.push_str(group_id);
        }
        key
    }

    /// Verifies the caller may register executors, returning their group id.
    pub(crate) async fn authorize_executor(&self, metadata: &MetadataMap) -> types::Result<String> {
        if !self.require_executor_authorization {
            return Ok(String::new());
        }

        let authenticator = self.authenticator.as_ref().ok_or_else(|| {
            Error::failed_precondition(
                "executor authorization required, but authenticator is not set",
            )
        })?;

        // Authenticate from scratch rather than reusing an earlier decision,
        // so credentials deleted after the stream was opened are caught.
        let user = authenticator.authenticate(metadata).await?;
        if !user.has_capability(Capability::RegisterExecutor) {
            return Err(Error::permission_denied(
                "credentials are missing the executor registration capability",
            ));
        }

        Ok(user.group_id)
    }

    /// Resolves the effective executor group id and default pool name for a
    /// submitting user.
    pub async fn get_group_id_and_default_pool_for_user(
        &self,
        metadata: &MetadataMap,
    ) -> types::Result<(String, String)> {
        let default_pool = self.default_pool_name.clone();

        if !self.enable_user_owned_executors {
            return Ok((String::new(), default_pool));
        }

        let Some(authenticator) = self.authenticator.as_ref() else {
            return Ok((self.shared_executor_pool_group_id.clone(), default_pool));
        };

        let user = authenticator.authenticate(metadata).await?;
        if user.use_group_owned_executors {
            return Ok((user.group_id, String::new()));
        }

        Ok((self.shared_executor_pool_group_id.clone(), default_pool))
    }

    pub async fn schedule_task(
        &self,
        request: ScheduleTaskRequest,
    ) -> types::Result<ScheduleTaskResponse> {
        if request.task_id.is_empty() {
            return Err(Error::invalid_argument("a task_id is required"));
        }
        let Some(metadata) = request.metadata.clone() else {
            return Err(Error::invalid_argument("scheduling metadata is required"));
        };
        if metadata.task_size.is_none() {
            return Err(Error::invalid_argument("a task_size is required"));
        }
        if request.serialized_task.is_empty() {
            return Err(Error::invalid_argument("a serialized task is required"));
        }

        self.task_store
            .insert(&request.task_id, &metadata, &request.serialized_task)
            .await?;

        let enqueue_request = EnqueueTaskReservationRequest {
            task_id: request.task_id.clone(),
            task_size: metadata.task_size.clone(),
            scheduling_metadata: Some(metadata),
            executor_id: String::new(),
        };
        self.enqueue_task_reservations(
            enqueue_request,
            Some(&request.serialized_task),
            EnqueueTaskReservationOpts {
                num_replicas: constant::PROBES_PER_TASK,
                max_attempts: 0,
                scheduler_local: false,
            },
        )
        .await?;

        Ok(ScheduleTaskResponse::default())
    }

    /// Peer-to-peer path: places a single reservation on an executor that is
    /// connected to this scheduler process.
    pub async fn enqueue_task_reservation(
        &self,
        request: EnqueueTaskReservationRequest,
    ) -> types::Result<EnqueueTaskReservationResponse> {
        self.enqueue_task_reservations(
            request,
            None,
            EnqueueTaskReservationOpts {
                num_replicas: 1,
                max_attempts: 10,
                scheduler_local: true,
            },
        )
        .await?;

        Ok(EnqueueTaskReservationResponse::default())
    }

    pub async fn re_enqueue_task(
        &self,
        request: ReEnqueueTaskRequest,
    ) -> types::Result<ReEnqueueTaskResponse> {
        if request.task_id.is_empty() {
            return Err(Error::invalid_argument("a task_id is required"));
        }

        let task = self.task_store.read(&request.task_id).await?;
        if task.attempt_count >= constant::MAX_TASK_ATTEMPT_COUNT {
            self.task_store.delete_claimed(&request.task_id).await?;
            return Err(Error::resource_exhausted(format!(
                "task already attempted {} times",
                task.attempt_count
            )));
        }

        // It's fine if the task was already unclaimed.
        let _ = self.task_store.unclaim(&request.task_id).await;

        tracing::debug!("re-enqueueing task '{}'", request.task_id);

        let enqueue_request = EnqueueTaskReservationRequest {
            task_id: request.task_id.clone(),
            task_size: task.metadata.task_size.clone(),
            scheduling_metadata: Some(task.metadata.clone()),
            executor_id: String::new(),
        };
        if let Err(e) = self
            .enqueue_task_reservations(
                enqueue_request,
                Some(&task.serialized_task),
                EnqueueTaskReservationOpts {
                    num_replicas: constant::PROBES_PER_TASK,
                    max_attempts: 0,
                    scheduler_local: false,
                },
            )
            .await
        {
            tracing::error!("re-enqueue failed for task '{}': {}", request.task_id, e);
            return Err(e);
        }

        tracing::debug!("re-enqueue succeeded for task '{}'", request.task_id);

        Ok(ReEnqueueTaskResponse::default())
    }

    pub async fn get_execution_nodes(
        &self,
        metadata: &MetadataMap,
        request: GetExecutionNodesRequest,
    ) -> types::Result<GetExecutionNodesResponse> {
        let mut group_id = request.group_id;
        if group_id.is_empty() {
            return Err(Error::invalid_argument("group not specified"));
        }

        // Executors do not belong to any group when executor authorization is
        // disabled.
        if !self.require_executor_authorization {
            group_id = String::new();
        }

        let execution_node = self.get_execution_nodes_from_kv(metadata, &group_id).await?;

        let mut user_owned_executors_supported = self.enable_user_owned_executors;
        // The shared executor pool is not reported as user owned.
        if user_owned_executors_supported && group_id == self.shared_executor_pool_group_id {
            user_owned_executors_supported = false;
        }

        Ok(GetExecutionNodesResponse {
            execution_node,
            user_owned_executors_supported,
        })
    }

    async fn get_execution_nodes_from_kv(
        &self,
        metadata: &MetadataMap,
        group_id: &str,
    ) -> types::Result<Vec<proto::scheduler::ExecutionNode>> {
        let caller_group_id = match self.authenticator.as_ref() {
            Some(authenticator) => authenticator.authenticate(metadata).await?.group_id,
            None => String::new(),
        };

        let pool_keys = self.kv.smembers(&self.executor_pools_key(group_id)).await?;

        let mut execution_nodes = vec![];
        for pool_key in pool_keys {
            let executors = self.kv.hget_all(&pool_key).await?;
            for (_, data) in executors {
                let registered =
                    proto::scheduler::RegisteredExecutionNode::decode_bytes(&data)
                        .map_err(Error::unknown)?;
                let Some(acl) = registered.acl.as_ref() else {
                    continue;
                };
                if !acl.authorize_read(&caller_group_id) {
                    continue;
                }
                if let Some(registration) = registered.registration {
                    execution_nodes.push(registration);
                }
            }
        }

        Ok(execution_nodes)
    }

    /// Places up to `num_replicas` reservation probes for a task: ranked
    /// candidates are cycled until enough probes landed, preferring the
    /// caller-supplied executor first when it is still connected. Each probe
    /// goes to a locally connected handle or over RPC to the scheduler that
    /// owns the target executor.
    pub(crate) async fn enqueue_task_reservations(
        &self,
        mut enqueue_request: EnqueueTaskReservationRequest,
        serialized_task: Option<&[u8]>,
        opts: EnqueueTaskReservationOpts,
    ) -> types::Result<()> {
        let metadata = enqueue_request
            .scheduling_metadata
            .clone()
            .unwrap_or_default();
        let key = PoolKey::from_metadata(&metadata);

        tracing::info!(
            "enqueue task reservations for task '{}' with pool key {:?}",
            enqueue_request.task_id,
            key
        );

        let pool = self.get_or_create_pool(&key);
        let task_size = enqueue_request.task_size.clone().unwrap_or_default();
        let node_count = pool
            .fit_count(&task_size, self.max_resource_capacity_ratio)
            .await?;

        if let Err(e) = pool.add_unclaimed_task(&enqueue_request.task_id).await {
            tracing::warn!("could not add task to unclaimed task list: {}", e);
        }

        let probe_count = opts.num_replicas.min(node_count);
        let mut probes_sent = 0;

        let start = Instant::now();
        let mut successful_reservations: Vec<String> = vec![];

        let (command, remote_instance_name) = extract_routing_props(serialized_task)?;

        // May be none if the executor id was not set or the executor is no
        // longer connected.
        let mut preferred_node = pool
            .find_connected_executor(&enqueue_request.executor_id)
            .await;

        let mut shutdown = self.shutdown.clone();
        let mut attempts = 0usize;
        let mut nodes: Vec<ExecutionNode> = vec![];
        let mut sample_index = 0usize;

        let result: types::Result<()> = loop {
            if probes_sent >= probe_count {
                break Ok(());
            }
            attempts += 1;

            if *shutdown.borrow_and_update() {
                break Err(Error::canceled("server is shutting down"));
            }
            if opts.max_attempts > 0 && attempts > opts.max_attempts {
                break Err(Error::resource_exhausted(
                    "could not enqueue task reservation to executor",
                ));
            }
            if attempts > 100 {
                tracing::warn!(
                    "attempted to send probe {} times for task '{}' with pool key {:?}, this should not happen",
                    attempts,
                    enqueue_request.task_id,
                    key
                );
            }

            if sample_index == 0 {
                if let Some(node) = preferred_node.take() {
                    // Taking the preference out means later iterations fall
                    // back to ranked sampling if this probe fails.
                    nodes = vec![node];
                } else {
                    let candidates = pool.candidate_nodes(opts.scheduler_local).await;
                    if candidates.is_empty() {
                        break Err(Error::unavailable(format!(
                            "no registered executors in pool '{}' with os '{}' with arch '{}'",
                            key.pool, key.os, key.arch
                        )));
                    }
                    nodes = self
                        .task_router
                        .rank_nodes(command.as_ref(), &remote_instance_name, candidates)
                        .await;
                }
            }
            if sample_index >= nodes.len() {
                break Err(Error::failed_precondition(format!(
                    "sample index {} >= {}",
                    sample_index,
                    nodes.len()
                )));
            }
            let node = nodes[sample_index].clone();
            sample_index = (sample_index + 1) % nodes.len();
            // Lets the scheduler owning this node prefer it for the probe.
            enqueue_request.executor_id = node.executor_id.clone();

            let enqueue_start = Instant::now();
            if opts.scheduler_local {
                let Some(handle) = node.handle.clone() else {
                    tracing::error!("nil handle for a local executor '{}'", node.executor_id);
                    continue;
                };
                if let Err(e) = handle.enqueue_task_reservation(enqueue_request.clone()).await {
                    tracing::debug!(
                        "local EnqueueTaskReservation to '{}' failed: {}",
                        node.executor_id,
                        e
                    );
                    continue;
                }
                metric::task_reservation_probe_count_metric()
                    .with_label_values(&["local"])
                    .inc();
            } else {
                let Some(uri) = node.scheduler_uri() else {
                    tracing::error!("node '{}' has no scheduler URI", node.executor_id);
                    continue;
                };
                let mut client = match self.client_cache.get(&uri) {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::warn!("could not get scheduler client for '{}': {}", uri, e);
                        continue;
                    }
                };
                let rpc = client.enqueue_task_reservation(tonic::Request::new(
                    enqueue_request.clone(),
                ));
                match tokio::time::timeout(
                    constant::SCHEDULER_ENQUEUE_TASK_RESERVATION_TIMEOUT,
                    rpc,
                )
                .await
                {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        tracing::warn!("EnqueueTaskReservation to '{}' failed: {}", uri, e);
                        tokio::time::sleep(
                            constant::SCHEDULER_ENQUEUE_TASK_RESERVATION_FAILURE_SLEEP,
                        )
                        .await;
                        continue;
                    }
                    Err(_) => {
                        tracing::warn!("EnqueueTaskReservation to '{}' timed out", uri);
                        tokio::time::sleep(
                            constant::SCHEDULER_ENQUEUE_TASK_RESERVATION_FAILURE_SLEEP,
                        )
                        .await;
                        continue;
                    }
                }
                metric::task_reservation_probe_count_metric()
                    .with_label_values(&["peer"])
                    .inc();
            }

            successful_reservations.push(format!("{} [{:?}]", node, enqueue_start.elapsed()));
            probes_sent += 1;
        };

        tracing::info!(
            "enqueue task reservations for task '{}' took {:?}, reservations: [{}]",
            enqueue_request.task_id,
            start.elapsed(),
            successful_reservations.join(", ")
        );

        result
    }
}
