use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::jwt::JwtService;
use crate::api::services::AppState;
use crate::config::StaticConfig;
use crate::services::{ControllerConfig, LinkController, policy_from_config};
use crate::storage::{StorageFactory, Store};
use crate::worker::WorkerPool;

pub struct StartupContext {
    pub store: Arc<dyn Store>,
    pub pool: WorkerPool,
    pub state: AppState,
    pub jwt: Arc<JwtService>,
    /// Bounds the lifetime of background tasks.
    pub token: CancellationToken,
}

/// 准备服务器启动的上下文：存储、工作池、控制器
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StorageFactory::create(&config.storage)
        .await
        .context("Failed to create storage backend")?;

    let token = CancellationToken::new();
    let pool = WorkerPool::new(Arc::clone(&store), &config.pool);
    pool.run(&token);

    let policy = policy_from_config(&config.codes);
    info!("Using code policy: {}", policy.name());

    let controller = LinkController::new(
        Arc::clone(&store),
        pool.clone(),
        policy,
        ControllerConfig::from_static(config),
    );

    let trusted_subnet = config
        .shortener
        .trusted_subnet()
        .context("Invalid trusted subnet")?;
    match &trusted_subnet {
        Some(subnet) => info!("Internal stats available to {}", subnet),
        None => info!("Internal stats disabled (no trusted subnet)"),
    }

    let jwt = Arc::new(JwtService::from_config(&config.identity));

    debug!("Pre-startup finished in {:?}", start_time.elapsed());
    Ok(StartupContext {
        store,
        pool,
        state: AppState {
            controller,
            trusted_subnet,
        },
        jwt,
        token,
    })
}
