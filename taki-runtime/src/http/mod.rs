use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use taki_core::config::Config;

mod prometheus;

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let app = Router::new().route("/metrics", get(prometheus::get_metrics));

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.http_port).parse()?;

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
