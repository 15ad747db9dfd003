use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::worker::WorkerPool;

/// 等待 Ctrl+C 信号
pub async fn listen_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

/// 停止后台任务：取消生命周期令牌，等待执行中的删除任务完成
pub async fn perform_shutdown_tasks(pool: &WorkerPool, token: &CancellationToken, timeout: Duration) {
    token.cancel();

    let pending = pool.pending();
    if pending > 0 {
        warn!("{} queued jobs will not run", pending);
    }

    if pool.shutdown_with_timeout(timeout).await {
        info!(
            "Worker pool stopped ({} completed, {} failed)",
            pool.completed(),
            pool.failed()
        );
    }
}
