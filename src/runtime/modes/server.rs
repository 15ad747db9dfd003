//! Server mode
//!
//! Wires storage, the worker pool and the controller into an actix-web
//! server (plus the gRPC server when enabled) and runs it until it stops or
//! Ctrl+C arrives.

use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::middleware::{IdentityMiddleware, RequestIdMiddleware};
use crate::api::services::configure_routes;
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::runtime::modes::grpc::spawn_grpc_server;

/// Run the HTTP server
///
/// **Note**: Logging must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let state = startup.state.clone();
    let jwt = startup.jwt.clone();
    let cookie_name = config.identity.cookie_name.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(IdentityMiddleware::new(jwt.clone(), &cookie_name))
            .wrap(Compress::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .workers(cpu_count)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    warn!("Starting server at http://{}", bind_address);
    warn!("Short links are served under {}", config.shortener.base_url);

    let grpc = if config.grpc.enabled {
        let token = startup.token.child_token();
        Some(spawn_grpc_server(&config.grpc, &startup.state, token).await?)
    } else {
        None
    };

    let result = tokio::select! {
        res = server => res.context("HTTP server failed"),
        _ = lifetime::shutdown::listen_for_shutdown() => Ok(()),
    };

    lifetime::shutdown::perform_shutdown_tasks(
        &startup.pool,
        &startup.token,
        Duration::from_secs(config.pool.shutdown_timeout_secs),
    )
    .await;

    if let Some(grpc) = grpc {
        match grpc.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("{:#}", e),
            Err(e) => error!("gRPC server task panicked: {}", e),
        }
    }
    info!("Storage backend {} closed", startup.store.backend_name());

    result
}
