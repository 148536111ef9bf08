use std::pin::Pin;

use taki_rpc::model::scheduler::error_to_status;
use taki_rpc::proto;
use taki_rpc::proto::scheduler::scheduler_server;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tonic::{Request, Response, Status, Streaming};

use crate::scheduler::SchedulerServer;

/// tonic adapter for [`SchedulerServer`]. Stream RPCs run on their own tasks
/// and feed channel-backed response streams; a failing handler terminates
/// the stream with its mapped status.
#[derive(Clone)]
pub struct SchedulerService {
    server: SchedulerServer,
}

impl SchedulerService {
    pub fn new(server: SchedulerServer) -> Self {
        Self { server }
    }
}

#[tonic::async_trait]
impl scheduler_server::Scheduler for SchedulerService {
    async fn schedule_task(
        &self,
        request: Request<proto::scheduler::ScheduleTaskRequest>,
    ) -> Result<Response<proto::scheduler::ScheduleTaskResponse>, Status> {
        let response = self
            .server
            .schedule_task(request.into_inner())
            .await
            .map_err(error_to_status)?;

        Ok(Response::new(response))
    }

    async fn enqueue_task_reservation(
        &self,
        request: Request<proto::scheduler::EnqueueTaskReservationRequest>,
    ) -> Result<Response<proto::scheduler::EnqueueTaskReservationResponse>, Status> {
        let response = self
            .server
            .enqueue_task_reservation(request.into_inner())
            .await
            .map_err(error_to_status)?;

        Ok(Response::new(response))
    }

    async fn re_enqueue_task(
        &self,
        request: Request<proto::scheduler::ReEnqueueTaskRequest>,
    ) -> Result<Response<proto::scheduler::ReEnqueueTaskResponse>, Status> {
        let response = self
            .server
            .re_enqueue_task(request.into_inner())
            .await
            .map_err(error_to_status)?;

        Ok(Response::new(response))
    }

    type LeaseTaskStream =
        Pin<Box<dyn Stream<Item = Result<proto::scheduler::LeaseTaskResponse, Status>> + Send>>;

    async fn lease_task(
        &self,
        request: Request<Streaming<proto::scheduler::LeaseTaskRequest>>,
    ) -> Result<Response<Self::LeaseTaskStream>, Status> {
        let executor_id = request
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let requests = request.into_inner();

        let (tx, rx) = mpsc::channel(32);
        let error_tx = tx.clone();
        let server = self.server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.lease_task(executor_id, requests, tx).await {
                let _ = error_tx.send(Err(error_to_status(e))).await;
            }
        });

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::LeaseTaskStream
        ))
    }

    type RegisterAndStreamWorkStream = Pin<
        Box<
            dyn Stream<Item = Result<proto::scheduler::RegisterAndStreamWorkResponse, Status>>
                + Send,
        >,
    >;

    async fn register_and_stream_work(
        &self,
        request: Request<Streaming<proto::scheduler::RegisterAndStreamWorkRequest>>,
    ) -> Result<Response<Self::RegisterAndStreamWorkStream>, Status> {
        let (metadata, _, requests) = request.into_parts();

        let (tx, rx) = mpsc::channel(32);
        let error_tx = tx.clone();
        let server = self.server.clone();
        tokio::spawn(async move {
            if let Err(e) = server
                .register_and_stream_work(metadata, requests, tx)
                .await
            {
                let _ = error_tx.send(Err(error_to_status(e))).await;
            }
        });

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::RegisterAndStreamWorkStream
        ))
    }

    async fn get_execution_nodes(
        &self,
        request: Request<proto::scheduler::GetExecutionNodesRequest>,
    ) -> Result<Response<proto::scheduler::GetExecutionNodesResponse>, Status> {
        let (metadata, _, inner) = request.into_parts();
        let response = self
            .server
            .get_execution_nodes(&metadata, inner)
            .await
            .map_err(error_to_status)?;

        Ok(Response::new(response))
    }
}
