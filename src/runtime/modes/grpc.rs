//! gRPC mode
//!
//! Serves [`ShortenerRpc`] next to the HTTP server, sharing its controller,
//! until the lifetime token is cancelled.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::api::services::AppState;
use crate::config::GrpcConfig;
use crate::rpc::ShortenerRpc;
use crate::rpc::proto::shortener_server::ShortenerServer;

/// Resolve the listen address and spawn the gRPC server.
pub async fn spawn_grpc_server(
    config: &GrpcConfig,
    state: &AppState,
    token: CancellationToken,
) -> Result<JoinHandle<Result<()>>> {
    let bind_address = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = tokio::net::lookup_host(&bind_address)
        .await
        .with_context(|| format!("Failed to resolve gRPC address {}", bind_address))?
        .next()
        .with_context(|| format!("No address found for {}", bind_address))?;

    let service = ShortenerServer::new(ShortenerRpc::from_state(state));
    warn!("Starting gRPC server at {}", addr);

    Ok(tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_shutdown(addr, async move { token.cancelled().await })
            .await
            .context("gRPC server failed")?;
        info!("gRPC server stopped");
        Ok(())
    }))
}
