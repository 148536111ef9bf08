mod http;
mod service;
mod telemetry;

use std::sync::Arc;

use taki_core::config::Config;
use taki_kv::{RedisKv, SharedKv};
use taki_scheduler::router::ShuffleRouter;
use taki_scheduler::scheduler::{SchedulerOptions, SchedulerServer};

use crate::service::scheduler::SchedulerService;

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();

    let config = Config::new().unwrap();

    telemetry::setup(&config).unwrap();

    let kv: SharedKv = Arc::new(
        RedisKv::connect(&config.persistence.redis_url)
            .await
            .unwrap(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    let scheduler = SchedulerServer::new(
        Some(kv),
        Some(Arc::new(ShuffleRouter)),
        None,
        &config,
        SchedulerOptions::default(),
        shutdown_rx,
    )
    .unwrap();

    let scheduler_service = SchedulerService::new(scheduler);

    let (_, health_service) = tonic_health::server::health_reporter();

    let mut rpc_server = tonic::transport::Server::builder().add_service(health_service);
    rpc_server = scheduler_service.register_rpc(rpc_server);

    tokio::spawn(http::start_server(config.clone()));

    tracing::info!("starting RPC server on port: {}", config.api.rpc_port);

    rpc_server
        .serve(
            format!("{}:{}", config.api.address, config.api.rpc_port)
                .parse()
                .unwrap(),
        )
        .await
        .unwrap();
}
