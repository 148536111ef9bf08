use std::sync::Arc;

use async_trait::async_trait;
use taki_core::errors::Error;
use taki_core::types;
use taki_kv::WriteOp;
use taki_rpc::proto;
use taki_rpc::proto::scheduler::{
    EnqueueTaskReservationRequest, EnqueueTaskReservationResponse, RegisterAndStreamWorkRequest,
    RegisterAndStreamWorkResponse,
};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tonic::metadata::MetadataMap;
use tonic::Status;

use crate::constant;
use crate::pool::{ExecutionNode, PoolKey};
use crate::scheduler::SchedulerServer;
use crate::task_store::PersistedTask;

/// Dispatch interface for one executor connected to this scheduler process.
#[async_trait]
pub trait ExecutorHandle: Send + Sync {
    fn group_id(&self) -> &str;

    async fn enqueue_task_reservation(
        &self,
        request: EnqueueTaskReservationRequest,
    ) -> types::Result<EnqueueTaskReservationResponse>;
}

/// Handle backed by an open registration stream. Reservations are pushed to
/// the executor as stream responses.
pub struct StreamExecutorHandle {
    group_id: String,
    tx: mpsc::Sender<Result<RegisterAndStreamWorkResponse, Status>>,
}

impl StreamExecutorHandle {
    pub fn new(
        group_id: String,
        tx: mpsc::Sender<Result<RegisterAndStreamWorkResponse, Status>>,
    ) -> Self {
        Self { group_id, tx }
    }
}

#[async_trait]
impl ExecutorHandle for StreamExecutorHandle {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn enqueue_task_reservation(
        &self,
        request: EnqueueTaskReservationRequest,
    ) -> types::Result<EnqueueTaskReservationResponse> {
        let response = RegisterAndStreamWorkResponse {
            enqueue_task_reservation_request: Some(request),
        };
        self.tx
            .send(Ok(response))
            .await
            .map_err(|_| Error::unavailable("executor stream is closed"))?;

        Ok(EnqueueTaskReservationResponse::default())
    }
}

impl SchedulerServer {
    fn check_preconditions(node: &proto::scheduler::ExecutionNode) -> types::Result<()> {
        if node.host.is_empty() || node.port <= 0 {
            return Err(Error::failed_precondition(format!(
                "cannot register node with empty host/port: {}:{}",
                node.host, node.port
            )));
        }

        Ok(())
    }

    fn pool_key_for_node(&self, group_id: &str, node: &proto::scheduler::ExecutionNode) -> PoolKey {
        let mut key = PoolKey {
            group_id: String::new(),
            os: node.os.clone(),
            arch: node.arch.clone(),
            pool: node.pool.clone(),
        };
        if self.enable_user_owned_executors {
            key.group_id = group_id.to_string();
        }
        key
    }

    async fn insert_or_update_node(
        &self,
        group_id: &str,
        node: &proto::scheduler::ExecutionNode,
        pool_key: &PoolKey,
    ) -> types::Result<()> {
        Self::check_preconditions(node)?;

        let acl = if self.require_executor_authorization {
            proto::scheduler::Acl {
                group_id: group_id.to_string(),
                group_read: true,
                group_write: true,
                others_read: false,
            }
        } else {
            proto::scheduler::Acl {
                group_id: group_id.to_string(),
                group_read: false,
                group_write: false,
                others_read: true,
            }
        };

        let registered = proto::scheduler::RegisteredExecutionNode {
            registration: Some(node.clone()),
            scheduler_host_port: self.own_host_port.clone(),
            group_id: group_id.to_string(),
            acl: Some(acl),
        };

        let pool_hash_key = pool_key.pool_hash_key();
        self.kv
            .txn(vec![
                WriteOp::HashSet {
                    key: pool_hash_key.clone(),
                    field: node.executor_id.clone(),
                    value: registered.encode_bytes(),
                },
                WriteOp::SetAdd {
                    key: self.executor_pools_key(group_id),
                    member: pool_hash_key,
                },
            ])
            .await
    }

    pub(crate) async fn add_connected_executor(
        &self,
        handle: &Arc<dyn ExecutorHandle>,
        node: &proto::scheduler::ExecutionNode,
    ) -> types::Result<()> {
        let pool_key = self.pool_key_for_node(handle.group_id(), node);
        self.insert_or_update_node(handle.group_id(), node, &pool_key)
            .await?;

        let pool = self.get_or_create_pool(&pool_key);
        let new_executor = pool
            .add_connected_executor(ExecutionNode {
                executor_id: node.executor_id.clone(),
                assignable_memory_bytes: node.assignable_memory_bytes,
                assignable_milli_cpu: node.assignable_milli_cpu,
                scheduler_host_port: None,
                handle: Some(handle.clone()),
            })
            .await;
        if !new_executor {
            return Ok(());
        }

        tracing::info!(
            "registered worker node '{}:{}' in pool {:?}",
            node.host,
            node.port,
            pool_key
        );

        let server = self.clone();
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = server.assign_work_to_node(&handle, &pool_key).await {
                tracing::warn!("failed to assign work to new node: {}", e);
            }
        });

        Ok(())
    }

    pub(crate) async fn remove_connected_executor(
        &self,
        group_id: &str,
        node: &proto::scheduler::ExecutionNode,
    ) {
        let pool_key = self.pool_key_for_node(group_id, node);
        match self.get_pool(&pool_key) {
            Some(pool) => {
                if !pool.remove_connected_executor(&node.executor_id).await {
                    tracing::warn!(
                        "executor '{}' not in pool {:?}",
                        node.executor_id,
                        pool_key
                    );
                }
            }
            None => {
                tracing::warn!(
                    "tried to remove executor '{}' for unknown pool {:?}",
                    node.executor_id,
                    pool_key
                );
            }
        }

        // The stream context is already cancelled when cleanup runs, so the
        // KV deletion gets its own deadline.
        let addr = format!("{}:{}", node.host, node.port);
        let cleanup = self.delete_node(node, &pool_key);
        match tokio::time::timeout(constant::REMOVE_EXECUTOR_CLEANUP_TIMEOUT, cleanup).await {
            Ok(Ok(())) => tracing::info!("unregistered worker node '{}'", addr),
            Ok(Err(e)) => tracing::warn!("could not unregister node '{}': {}", addr, e),
            Err(_) => tracing::warn!("could not unregister node '{}': cleanup timed out", addr),
        }
    }

    async fn delete_node(
        &self,
        node: &proto::scheduler::ExecutionNode,
        pool_key: &PoolKey,
    ) -> types::Result<()> {
        Self::check_preconditions(node)?;
        self.kv
            .hdel(&pool_key.pool_hash_key(), &node.executor_id)
            .await
    }

    /// On-join work handoff: sends reservations for a sample of the pool's
    /// unclaimed tasks to a newly connected executor.
    async fn assign_work_to_node(
        &self,
        handle: &Arc<dyn ExecutorHandle>,
        pool_key: &PoolKey,
    ) -> types::Result<()> {
        let tasks = self
            .sample_unclaimed_tasks(constant::TASKS_TO_ENQUEUE_ON_JOIN, pool_key)
            .await?;

        for task in tasks {
            let request = EnqueueTaskReservationRequest {
                task_id: task.task_id.clone(),
                task_size: task.metadata.task_size.clone(),
                scheduling_metadata: None,
                executor_id: String::new(),
            };
            handle.enqueue_task_reservation(request).await?;
        }

        Ok(())
    }

    async fn sample_unclaimed_tasks(
        &self,
        count: usize,
        pool_key: &PoolKey,
    ) -> types::Result<Vec<PersistedTask>> {
        let Some(pool) = self.get_pool(pool_key) else {
            return Ok(vec![]);
        };
        let task_ids = pool.sample_unclaimed_tasks(count).await?;
        self.task_store.read_many(&task_ids).await
    }

    /// Serves one executor registration stream: upserts registrations into
    /// the KV pool hash and the in-memory connected list, revalidates
    /// credentials periodically, and cleans both up when the stream ends.
    pub async fn register_and_stream_work<S>(
        &self,
        metadata: MetadataMap,
        requests: S,
        response_tx: mpsc::Sender<Result<RegisterAndStreamWorkResponse, Status>>,
    ) -> types::Result<()>
    where
        S: Stream<Item = Result<RegisterAndStreamWorkRequest, Status>> + Send + Unpin + 'static,
    {
        let group_id = self.authorize_executor(&metadata).await?;
        let handle: Arc<dyn ExecutorHandle> =
            Arc::new(StreamExecutorHandle::new(group_id, response_tx));

        self.process_executor_stream(metadata, requests, handle).await
    }

    async fn process_executor_stream<S>(
        &self,
        metadata: MetadataMap,
        mut requests: S,
        handle: Arc<dyn ExecutorHandle>,
    ) -> types::Result<()>
    where
        S: Stream<Item = Result<RegisterAndStreamWorkRequest, Status>> + Send + Unpin + 'static,
    {
        // The blocking receive runs on its own task so the loop below can
        // also observe server shutdown and the credential revalidation
        // ticker.
        let (registration_tx, mut registration_rx) =
            mpsc::channel::<Result<proto::scheduler::ExecutionNode, Status>>(1);
        tokio::spawn(async move {
            while let Some(message) = requests.next().await {
                match message {
                    Ok(request) => {
                        let Some(node) = request
                            .register_executor_request
                            .and_then(|r| r.node)
                        else {
                            continue;
                        };
                        if registration_tx.send(Ok(node)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = registration_tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        let mut check_credentials =
            tokio::time::interval(constant::CHECK_REGISTRATION_CREDENTIALS_INTERVAL);
        // The first interval tick fires immediately.
        check_credentials.tick().await;

        let mut shutdown = self.shutdown.clone();
        let mut registered_node: Option<proto::scheduler::ExecutionNode> = None;

        let result = loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    break Err(Error::canceled("server is shutting down"));
                }
                message = registration_rx.recv() => {
                    match message {
                        None => break Ok(()),
                        Some(Err(e)) => break Err(Error::unknown(e)),
                        Some(Ok(registration)) => {
                            if let Err(e) = self.add_connected_executor(&handle, &registration).await {
                                break Err(e);
                            }
                            registered_node = Some(registration);
                        }
                    }
                }
                _ = check_credentials.tick() => {
                    if let Err(e) = self.authorize_executor(&metadata).await {
                        if e.is_permission_denied() || e.is_unauthenticated() {
                            break Err(e);
                        }
                        tracing::warn!("could not revalidate executor registration: {}", e);
                    }
                }
            }
        };

        if let Some(node) = registered_node {
            self.remove_connected_executor(handle.group_id(), &node).await;
        }

        result
    }
}
