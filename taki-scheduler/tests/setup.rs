#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use prost::Message;
use taki_core::config::{
    api::Api, persistence::Persistence, remote_execution::RemoteExecution, telemetry::Telemetry,
    Config,
};
use taki_kv::{MemoryKv, SharedKv};
use taki_rpc::proto::scheduler::scheduler_client::SchedulerClient;
use taki_rpc::proto::scheduler::scheduler_server::SchedulerServer as SchedulerRpcServer;
use taki_rpc::proto::scheduler::{
    Command, EnqueueTaskReservationRequest, ExecutionNode, ExecutionTask,
    RegisterAndStreamWorkRequest, RegisterAndStreamWorkResponse, RegisterExecutorRequest,
    SchedulingMetadata, TaskSize,
};
use taki_scheduler::pool::PoolKey;
use taki_scheduler::router::ShuffleRouter;
use taki_scheduler::rpc::SchedulerService;
use taki_scheduler::scheduler::{SchedulerOptions, SchedulerServer};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Channel;
use tonic::Streaming;

pub fn shared_kv() -> SharedKv {
    Arc::new(MemoryKv::new())
}

pub fn test_config() -> Config {
    Config {
        api: Api {
            address: "127.0.0.1".to_string(),
            rpc_port: 0,
            http_port: 0,
        },
        persistence: Persistence {
            redis_url: "redis://127.0.0.1:6379".to_string(),
        },
        remote_execution: RemoteExecution {
            default_pool_name: "default".to_string(),
            shared_executor_pool_group_id: "shared".to_string(),
            enable_user_owned_executors: false,
            require_executor_authorization: false,
            max_resource_capacity_ratio: 1.0,
        },
        telemetry: Telemetry { stdout: None },
    }
}

pub struct TestScheduler {
    pub server: SchedulerServer,
    pub addr: SocketAddr,
    /// Keeps the shutdown channel alive for the server's lifetime.
    _shutdown_tx: watch::Sender<bool>,
}

impl TestScheduler {
    pub async fn client(&self) -> SchedulerClient<Channel> {
        SchedulerClient::connect(format!("http://{}", self.addr))
            .await
            .expect("connect to test scheduler")
    }
}

pub async fn start_scheduler(kv: SharedKv) -> TestScheduler {
    start_scheduler_with_config(kv, test_config()).await
}

pub async fn start_scheduler_with_config(kv: SharedKv, config: Config) -> TestScheduler {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let options = SchedulerOptions {
        local_hostname_override: Some("127.0.0.1".to_string()),
        local_port_override: Some(addr.port()),
        require_executor_authorization: false,
    };

    let server = SchedulerServer::new(
        Some(kv),
        Some(Arc::new(ShuffleRouter)),
        None,
        &config,
        options,
        shutdown_rx,
    )
    .expect("build scheduler server");

    let service = SchedulerService::new(server.clone());
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(SchedulerRpcServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .expect("serve test scheduler");
    });

    TestScheduler {
        server,
        addr,
        _shutdown_tx: shutdown_tx,
    }
}

pub fn linux_pool_key() -> PoolKey {
    PoolKey {
        group_id: String::new(),
        os: "linux".to_string(),
        arch: "x86".to_string(),
        pool: "default".to_string(),
    }
}

pub fn task_metadata(memory_bytes: i64, milli_cpu: i64) -> SchedulingMetadata {
    SchedulingMetadata {
        task_size: Some(TaskSize {
            estimated_memory_bytes: memory_bytes,
            estimated_milli_cpu: milli_cpu,
        }),
        os: "linux".to_string(),
        arch: "x86".to_string(),
        pool: "default".to_string(),
        executor_group_id: String::new(),
    }
}

pub fn execution_node(executor_id: &str, memory_bytes: i64, milli_cpu: i64) -> ExecutionNode {
    ExecutionNode {
        host: "10.0.0.1".to_string(),
        port: 8080,
        executor_id: executor_id.to_string(),
        os: "linux".to_string(),
        arch: "x86".to_string(),
        pool: "default".to_string(),
        assignable_memory_bytes: memory_bytes,
        assignable_milli_cpu: milli_cpu,
    }
}

pub fn serialized_task() -> Vec<u8> {
    ExecutionTask {
        command: Some(Command {
            arguments: vec!["/usr/bin/cc".to_string(), "main.c".to_string()],
        }),
        instance_name: String::new(),
    }
    .encode_to_vec()
}

/// A fake executor attached through a real registration stream.
pub struct RegisteredExecutor {
    pub requests_tx: mpsc::Sender<RegisterAndStreamWorkRequest>,
    pub responses: Streaming<RegisterAndStreamWorkResponse>,
}

impl RegisteredExecutor {
    /// Next reservation pushed to this executor, or None on timeout.
    pub async fn next_reservation(&mut self) -> Option<EnqueueTaskReservationRequest> {
        match tokio::time::timeout(Duration::from_secs(5), self.responses.message()).await {
            Ok(Ok(Some(response))) => response.enqueue_task_reservation_request,
            _ => None,
        }
    }
}

pub async fn register_executor(
    client: &mut SchedulerClient<Channel>,
    node: ExecutionNode,
) -> RegisteredExecutor {
    let (requests_tx, requests_rx) = mpsc::channel(16);
    requests_tx
        .send(RegisterAndStreamWorkRequest {
            register_executor_request: Some(RegisterExecutorRequest { node: Some(node) }),
        })
        .await
        .expect("queue registration");

    let responses = client
        .register_and_stream_work(ReceiverStream::new(requests_rx))
        .await
        .expect("open registration stream")
        .into_inner();

    RegisteredExecutor {
        requests_tx,
        responses,
    }
}

/// Waits until the registration stream above has been processed server-side.
pub async fn wait_for_connected_executor(
    server: &SchedulerServer,
    key: &PoolKey,
    executor_id: &str,
) {
    for _ in 0..500 {
        if let Some(pool) = server.get_pool(key) {
            if pool.find_connected_executor(executor_id).await.is_some() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("executor '{}' did not register in time", executor_id);
}
