mod setup;

use std::time::Duration;

use taki_rpc::proto::scheduler::{LeaseTaskRequest, LeaseTaskResponse, ScheduleTaskRequest};
use taki_rpc::proto::scheduler::scheduler_client::SchedulerClient;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Status, Streaming};

use setup::*;

struct LeaseStream {
    requests_tx: mpsc::Sender<LeaseTaskRequest>,
    responses: Streaming<LeaseTaskResponse>,
}

impl LeaseStream {
    async fn open(client: &mut SchedulerClient<Channel>) -> Self {
        let (requests_tx, requests_rx) = mpsc::channel(16);
        let responses = client
            .lease_task(ReceiverStream::new(requests_rx))
            .await
            .expect("open lease stream")
            .into_inner();
        Self {
            requests_tx,
            responses,
        }
    }

    async fn send(&self, task_id: &str, finalize: bool) {
        self.requests_tx
            .send(LeaseTaskRequest {
                task_id: task_id.to_string(),
                finalize,
            })
            .await
            .expect("send lease request");
    }

    async fn recv(&mut self) -> Result<Option<LeaseTaskResponse>, Status> {
        tokio::time::timeout(Duration::from_secs(5), self.responses.message())
            .await
            .expect("lease response timed out")
    }
}

async fn wait_for_unclaimed(kv: &taki_kv::SharedKv, task_id: &str) {
    let key = format!("task/{}", task_id);
    for _ in 0..500 {
        let vals = kv.hmget(&key, &["claimed"]).await.expect("read claim field");
        if vals[0].is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task '{}' was never unclaimed", task_id);
}

#[tokio::test]
async fn lease_claims_then_finalizes_cleanly() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
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
        .expect("executor receives the probe");
    assert_eq!(reservation.task_id, "task-1");

    let mut lease = LeaseStream::open(&mut client).await;
    lease.send("task-1", false).await;

    let response = lease
        .recv()
        .await
        .expect("first lease response")
        .expect("stream open");
    assert_eq!(response.serialized_task, serialized_task());
    assert_eq!(response.lease_duration_seconds, 10);
    assert!(!response.closed_cleanly);

    // A renewal does not carry the payload again.
    lease.send("task-1", false).await;
    let response = lease.recv().await.expect("renewal").expect("stream open");
    assert!(response.serialized_task.is_empty());
    assert!(!response.closed_cleanly);

    lease.send("task-1", true).await;
    let response = lease.recv().await.expect("finalize").expect("stream open");
    assert!(response.closed_cleanly);

    // The finalize deleted the task.
    let err = scheduler
        .server
        .task_store()
        .read("task-1")
        .await
        .expect_err("task must be gone");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn only_one_of_two_leasers_wins() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    let store = scheduler.server.task_store();
    store
        .insert("task-1", &task_metadata(1024, 500), b"payload")
        .await
        .expect("insert task");

    let mut first = LeaseStream::open(&mut client).await;
    first.send("task-1", false).await;
    let response = first
        .recv()
        .await
        .expect("winner response")
        .expect("stream open");
    assert_eq!(response.serialized_task, b"payload");

    // The second leaser loses the claim race.
    let mut second = LeaseStream::open(&mut client).await;
    second.send("task-1", false).await;
    let status = second.recv().await.expect_err("loser gets an error");
    assert_eq!(status.code(), tonic::Code::NotFound);

    first.send("task-1", true).await;
    let response = first.recv().await.expect("finalize").expect("stream open");
    assert!(response.closed_cleanly);

    let err = store.read("task-1").await.expect_err("task must be gone");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn abandoned_lease_is_re_enqueued() {
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
    executor.next_reservation().await.expect("initial probe");

    let store = scheduler.server.task_store();

    {
        let mut lease = LeaseStream::open(&mut client).await;
        lease.send("task-1", false).await;
        lease.recv().await.expect("claim response").expect("stream open");
        assert_eq!(store.read("task-1").await.expect("read task").attempt_count, 1);

        // The stream drops without a finalize.
    }

    // The abandonment path releases the claim and re-enqueues the task.
    wait_for_unclaimed(&kv, "task-1").await;
    executor
        .next_reservation()
        .await
        .expect("re-enqueue probes the executor again");

    let unclaimed = kv
        .zrange_all(&linux_pool_key().unclaimed_tasks_key())
        .await
        .expect("read unclaimed set");
    assert!(unclaimed.contains(&"task-1".to_string()));

    // A new lease claims the task for the second attempt.
    let mut lease = LeaseStream::open(&mut client).await;
    lease.send("task-1", false).await;
    lease.recv().await.expect("second claim").expect("stream open");
    assert_eq!(store.read("task-1").await.expect("read task").attempt_count, 2);
}

#[tokio::test]
async fn re_enqueue_deletes_task_at_attempt_cap() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    let store = scheduler.server.task_store();
    store
        .insert("task-1", &task_metadata(1024, 500), b"payload")
        .await
        .expect("insert task");

    // Four full claim/release cycles plus a fifth claim leave the task
    // claimed with the attempt count at the cap.
    for _ in 0..4 {
        store.claim("task-1").await.expect("claim");
        store.unclaim("task-1").await.expect("unclaim");
    }
    store.claim("task-1").await.expect("final claim");
    assert_eq!(store.read("task-1").await.expect("read").attempt_count, 5);

    let status = client
        .re_enqueue_task(taki_rpc::proto::scheduler::ReEnqueueTaskRequest {
            task_id: "task-1".to_string(),
        })
        .await
        .expect_err("attempt cap reached");
    assert_eq!(status.code(), tonic::Code::ResourceExhausted);

    let err = store.read("task-1").await.expect_err("task deleted at cap");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn lease_rejects_mismatched_task_ids() {
    let kv = shared_kv();
    let scheduler = start_scheduler(kv).await;
    let mut client = scheduler.client().await;

    let store = scheduler.server.task_store();
    store
        .insert("task-1", &task_metadata(1024, 500), b"payload")
        .await
        .expect("insert task");

    let mut lease = LeaseStream::open(&mut client).await;
    lease.send("task-1", false).await;
    lease.recv().await.expect("claim response").expect("stream open");

    lease.send("task-2", false).await;
    let status = lease.recv().await.expect_err("mismatched task id");
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn lease_requires_task_id() {
    let scheduler = start_scheduler(shared_kv()).await;
    let mut client = scheduler.client().await;

    let mut lease = LeaseStream::open(&mut client).await;
    lease.send("", false).await;
    let status = lease.recv().await.expect_err("empty task id");
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}
