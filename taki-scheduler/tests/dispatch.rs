mod setup;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use taki_core::errors::Error;
use taki_core::types;
use taki_rpc::proto::scheduler::{
    EnqueueTaskReservationRequest, EnqueueTaskReservationResponse, GetExecutionNodesRequest,
    ScheduleTaskRequest,
};
use taki_scheduler::executor::ExecutorHandle;
use taki_scheduler::pool::ExecutionNode;

use setup::*;

#[tokio::test]
async fn schedule_task_validates_request() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let cases = vec![
        ScheduleTaskRequest::default(),
        ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            ..Default::default()
        },
        ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            metadata: Some(Default::default()),
            ..Default::default()
        },
        ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            metadata: Some(task_metadata(1, 1)),
            serialized_task: vec![],
        },
    ];

    for request in cases {
        let status = client
            .schedule_task(request.clone())
            .await
            .expect_err("invalid request must fail");
        assert_eq!(
            status.code(),
            tonic::Code::InvalidArgument,
            "request {:?}",
            request
        );
    }
}

#[tokio::test]
async fn schedule_task_without_executors_is_unavailable() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let status = client
        .schedule_task(ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            metadata: Some(task_metadata(1024, 500)),
            serialized_task: serialized_task(),
        })
        .await
        .expect_err("no executors registered");
    assert_eq!(status.code(), tonic::Code::Unavailable);
}

#[tokio::test]
async fn duplicate_schedule_is_rejected() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    let request = ScheduleTaskRequest {
        task_id: "task-1".to_string(),
        metadata: Some(task_metadata(1024, 500)),
        serialized_task: serialized_task(),
    };
    client
        .schedule_task(request.clone())
        .await
        .expect("first schedule");
    assert!(executor.next_reservation().await.is_some());

    let status = client
        .schedule_task(request)
        .await
        .expect_err("second schedule");
    assert_eq!(status.code(), tonic::Code::AlreadyExists);
}

#[tokio::test]
async fn schedule_task_probes_registered_executor() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv.clone()).await;
    let mut client = scheduler.client().await;

    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    client
        .schedule_task(ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            metadata: Some(task_metadata(1024, 500)),
            serialized_task: serialized_task(),
        })
        .await
        .expect("schedule task");

    let reservation = executor
        .next_reservation()
        .await
        .expect("executor receives a probe");
    assert_eq!(reservation.task_id, "task-1");
    assert_eq!(reservation.executor_id, "executor-1");

    // The dispatch also registered the task in the pool's unclaimed set.
    let unclaimed = kv
        .zrange_all(&linux_pool_key().unclaimed_tasks_key())
        .await
        .expect("read unclaimed set");
    assert!(unclaimed.contains(&"task-1".to_string()));
}

#[tokio::test]
async fn enqueue_task_reservation_uses_local_executor() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    client
        .enqueue_task_reservation(EnqueueTaskReservationRequest {
            task_id: "task-1".to_string(),
            task_size: task_metadata(1024, 500).task_size,
            scheduling_metadata: Some(task_metadata(1024, 500)),
            executor_id: String::new(),
        })
        .await
        .expect("enqueue reservation");

    let reservation = executor
        .next_reservation()
        .await
        .expect("executor receives the probe");
    assert_eq!(reservation.task_id, "task-1");
}

struct CountingHandle {
    calls: AtomicUsize,
}

#[async_trait]
impl ExecutorHandle for CountingHandle {
    fn group_id(&self) -> &str {
        ""
    }

    async fn enqueue_task_reservation(
        &self,
        _request: EnqueueTaskReservationRequest,
    ) -> types::Result<EnqueueTaskReservationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::unavailable("executor went away"))
    }
}

#[tokio::test]
async fn dispatch_gives_up_after_max_attempts() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    // The executor is registered but every probe to it fails.
    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    let pool = scheduler.server.get_or_create_pool(&linux_pool_key());
    pool.remove_connected_executor("executor-1").await;
    let counting = Arc::new(CountingHandle {
        calls: AtomicUsize::new(0),
    });
    pool.add_connected_executor(ExecutionNode {
        executor_id: "executor-1".to_string(),
        assignable_memory_bytes: 4096,
        assignable_milli_cpu: 4000,
        scheduler_host_port: None,
        handle: Some(counting.clone()),
    })
    .await;

    let status = client
        .enqueue_task_reservation(EnqueueTaskReservationRequest {
            task_id: "task-1".to_string(),
            task_size: task_metadata(1024, 500).task_size,
            scheduling_metadata: Some(task_metadata(1024, 500)),
            executor_id: String::new(),
        })
        .await
        .expect_err("all probes fail");
    assert_eq!(status.code(), tonic::Code::ResourceExhausted);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 10);

    drop(executor.requests_tx);
}

#[tokio::test]
async fn preferred_executor_is_probed_first() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let mut executor_1 = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    let mut executor_2 = register_executor(&mut client, execution_node("executor-2", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-2").await;

    client
        .enqueue_task_reservation(EnqueueTaskReservationRequest {
            task_id: "task-1".to_string(),
            task_size: task_metadata(1024, 500).task_size,
            scheduling_metadata: Some(task_metadata(1024, 500)),
            executor_id: "executor-2".to_string(),
        })
        .await
        .expect("enqueue reservation");

    let reservation = executor_2
        .next_reservation()
        .await
        .expect("preferred executor receives the probe");
    assert_eq!(reservation.task_id, "task-1");

    drop(executor_1.requests_tx);
}

#[tokio::test]
async fn on_join_handoff_samples_unclaimed_tasks() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    // Ten unclaimed tasks already sit in the pool before anyone connects.
    let store = scheduler.server.task_store();
    let pool = scheduler.server.get_or_create_pool(&linux_pool_key());
    for i in 0..10 {
        let task_id = format!("task-{}", i);
        store
            .insert(&task_id, &task_metadata(16, 16), b"payload")
            .await
            .expect("insert task");
        pool.add_unclaimed_task(&task_id).await.expect("track task");
    }

    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    let mut received = std::collections::HashSet::new();
    for _ in 0..10 {
        let Some(reservation) = executor.next_reservation().await else {
            break;
        };
        received.insert(reservation.task_id);
    }

    assert_eq!(received.len(), 10, "handoff should cover all sampled tasks");
}

#[tokio::test]
async fn cross_scheduler_dispatch_reaches_remote_executor() {
    let kv = shared_kv();
    let scheduler_a = start_scheduler(kv.clone()).await;
    let scheduler_b = start_scheduler(kv).await;

    // The only fitting executor streams to scheduler B.
    let mut client_b = scheduler_b.client().await;
    let mut executor = register_executor(&mut client_b, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler_b.server, &linux_pool_key(), "executor-1").await;

    let mut client_a = scheduler_a.client().await;
    client_a
        .schedule_task(ScheduleTaskRequest {
            task_id: "task-1".to_string(),
            metadata: Some(task_metadata(1024, 500)),
            serialized_task: serialized_task(),
        })
        .await
        .expect("schedule through scheduler A");

    let reservation = executor
        .next_reservation()
        .await
        .expect("remote executor receives the probe");
    assert_eq!(reservation.task_id, "task-1");

    // Scheduler A never saw the executor locally; the probe went peer to
    // peer.
    let pool_a = scheduler_a.server.get_or_create_pool(&linux_pool_key());
    assert!(pool_a.find_connected_executor("executor-1").await.is_none());
}

#[tokio::test]
async fn get_execution_nodes_lists_registered_executors() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let mut executor = register_executor(&mut client, execution_node("executor-1", 4096, 4000)).await;
    wait_for_connected_executor(&scheduler.server, &linux_pool_key(), "executor-1").await;

    let response = client
        .get_execution_nodes(GetExecutionNodesRequest {
            group_id: "group-1".to_string(),
        })
        .await
        .expect("list execution nodes")
        .into_inner();

    assert_eq!(response.execution_node.len(), 1);
    assert_eq!(response.execution_node[0].executor_id, "executor-1");
    assert!(!response.user_owned_executors_supported);

    let status = client
        .get_execution_nodes(GetExecutionNodesRequest::default())
        .await
        .expect_err("group is required");
    assert_eq!(status.code(), tonic::Code::InvalidArgument);

    drop(executor.requests_tx);
}
