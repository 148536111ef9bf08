use taki_rpc::proto::scheduler::scheduler_server::SchedulerServer as SchedulerRpcServer;
use taki_scheduler::rpc::SchedulerService as SchedulerRpcService;

use super::Service;

#[derive(Clone)]
pub struct SchedulerService {
    inner: SchedulerRpcService,
}

impl SchedulerService {
    pub fn new(server: taki_scheduler::scheduler::SchedulerServer) -> Box<dyn Service> {
        Box::new(Self {
            inner: SchedulerRpcService::new(server),
        })
    }
}

impl Service for SchedulerService {
    fn register_rpc(
        &self,
        server: tonic::transport::server::Router,
    ) -> tonic::transport::server::Router {
        server.add_service(SchedulerRpcServer::new(self.inner.clone()))
    }
}
