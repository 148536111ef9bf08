use std::time::Instant;

use chrono::Utc;
use taki_core::errors::Error;
use taki_core::types;
use taki_rpc::proto::scheduler::{LeaseTaskRequest, LeaseTaskResponse, ReEnqueueTaskRequest};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tonic::Status;

use crate::constant;
use crate::metric;
use crate::pool::PoolKey;
use crate::scheduler::SchedulerServer;

impl SchedulerServer {
    /// Serves one lease stream: the first message claims the task and gets
    /// the payload back, later messages renew the lease, and a message with
    /// `finalize` deletes the task. A stream that ends with the claim still
    /// held re-enqueues the task.
    pub async fn lease_task<S>(
        &self,
        executor_id: String,
        mut requests: S,
        response_tx: mpsc::Sender<Result<LeaseTaskResponse, Status>>,
    ) -> types::Result<()>
    where
        S: Stream<Item = Result<LeaseTaskRequest, Status>> + Send + Unpin,
    {
        let mut last_checkin = Instant::now();
        let mut claimed = false;
        let mut task_id = String::new();

        let result: types::Result<()> = loop {
            let request = match requests.next().await {
                None => {
                    tracing::debug!("LeaseTask '{}' stream ended", task_id);
                    break Ok(());
                }
                Some(Err(e)) => {
                    tracing::debug!("LeaseTask '{}' recv failed: {}", task_id, e);
                    break Ok(());
                }
                Some(Ok(request)) => request,
            };

            if request.task_id.is_empty() || (!task_id.is_empty() && request.task_id != task_id) {
                break Err(Error::invalid_argument(
                    "task_id must be set and identical across all requests",
                ));
            }
            task_id = request.task_id.clone();

            if last_checkin.elapsed() > constant::LEASE_INTERVAL + constant::LEASE_GRACE_PERIOD {
                tracing::warn!(
                    "LeaseTask '{}' client went away after {:?}",
                    task_id,
                    last_checkin.elapsed()
                );
                break Ok(());
            }

            let mut response = LeaseTaskResponse {
                lease_duration_seconds: constant::LEASE_INTERVAL.as_secs() as i64,
                ..Default::default()
            };

            if !claimed {
                if let Err(e) = self.task_store.claim(&task_id).await {
                    break Err(e);
                }
                claimed = true;

                let task = match self.task_store.read(&task_id).await {
                    Ok(task) => task,
                    Err(e) => {
                        tracing::error!("LeaseTask '{}' error reading task: {}", task_id, e);
                        break Err(e);
                    }
                };

                tracing::info!(
                    "LeaseTask task '{}' claimed by executor '{}'",
                    task_id,
                    executor_id
                );

                let key = PoolKey::from_metadata(&task.metadata);
                if let Some(pool) = self.get_pool(&key) {
                    if let Err(e) = pool.remove_unclaimed_task(&task_id).await {
                        tracing::warn!("could not remove task from unclaimed list: {}", e);
                    }
                }

                let age_ms = (Utc::now() - task.queued_timestamp).num_milliseconds();
                metric::queue_wait_time_ms_metric().observe(age_ms as f64);
                response.serialized_task = task.serialized_task;
            }

            let closing = request.finalize;
            if closing && claimed {
                if self.task_store.delete_claimed(&task_id).await.is_ok() {
                    claimed = false;
                    tracing::info!(
                        "LeaseTask task '{}' finalized by executor '{}'",
                        task_id,
                        executor_id
                    );
                }
            }

            response.closed_cleanly = !claimed;
            last_checkin = Instant::now();
            if response_tx.send(Ok(response)).await.is_err() {
                break Err(Error::unavailable("lease stream send failed"));
            }
            if closing {
                break Ok(());
            }
        };

        // The worker did not finish properly if the claim is still held, so
        // the task goes back on the queue. The stream is gone at this point;
        // the re-enqueue runs under its own deadline.
        if claimed {
            tracing::warn!(
                "LeaseTask '{}' exited event loop with the task still claimed, re-enqueueing",
                task_id
            );
            let re_enqueue = self.re_enqueue_task(ReEnqueueTaskRequest {
                task_id: task_id.clone(),
            });
            match tokio::time::timeout(constant::LEASE_FINALIZATION_TIMEOUT, re_enqueue).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::error!("LeaseTask '{}' failed to re-enqueue task: {}", task_id, e);
                }
                Err(_) => {
                    tracing::error!("LeaseTask '{}' timed out re-enqueueing task", task_id);
                }
            }
        }

        result
    }
}
