//! Bounded pool of executors draining one FIFO job queue.
//!
//! `push` is the backpressure point: when the queue is full it waits for a
//! free slot instead of dropping the job. Executors share a single receiver,
//! so jobs start in queue order but may finish in any order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::Job;
use crate::config::PoolConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::Store;

struct PoolInner {
    store: Arc<dyn Store>,
    workers: usize,
    tx: mpsc::Sender<Job>,
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    token: CancellationToken,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
    completed: AtomicU64,
    failed: AtomicU64,
}

#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    pub fn new(store: Arc<dyn Store>, config: &PoolConfig) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            inner: Arc::new(PoolInner {
                store,
                workers,
                tx,
                rx: Arc::new(Mutex::new(rx)),
                token: CancellationToken::new(),
                handles: std::sync::Mutex::new(Vec::new()),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    /// Queue a job, waiting while the queue is full.
    ///
    /// Fails with `PoolClosed` once the pool has been shut down, including
    /// while waiting for a slot.
    pub async fn push(&self, job: Job) -> Result<()> {
        let token = &self.inner.token;
        if token.is_cancelled() {
            return Err(ShortenerError::pool_closed("worker pool is shut down"));
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                Err(ShortenerError::pool_closed("worker pool shut down while waiting for a slot"))
            }
            sent = self.inner.tx.send(job) => sent.map_err(|_| {
                ShortenerError::pool_closed("worker pool queue is closed")
            }),
        }
    }

    /// Spawn the executors. `parent` bounds the pool lifetime: cancelling it
    /// has the same effect as [`WorkerPool::shutdown`] minus the join.
    pub fn run(&self, parent: &CancellationToken) {
        let mut handles = match self.inner.handles.lock() {
            Ok(handles) => handles,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !handles.is_empty() {
            warn!("Worker pool already running");
            return;
        }

        let token = self.inner.token.clone();
        let parent = parent.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = parent.cancelled() => token.cancel(),
                _ = token.cancelled() => {}
            }
        });

        for worker_id in 0..self.inner.workers {
            let inner = Arc::clone(&self.inner);
            handles.push(tokio::spawn(worker_loop(worker_id, inner)));
        }
        info!(
            "Worker pool started: {} workers, queue capacity {}",
            self.inner.workers,
            self.inner.tx.max_capacity()
        );
    }

    /// Stop pulling new jobs, wait for in-flight jobs and drop the rest.
    pub async fn shutdown(&self) {
        self.inner.token.cancel();

        let handles: Vec<JoinHandle<()>> = match self.inner.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {}", e);
            }
        }

        let mut rx = self.inner.rx.lock().await;
        rx.close();
        let mut dropped = 0usize;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!("Worker pool shut down with {} queued jobs dropped", dropped);
        } else {
            info!("Worker pool shut down");
        }
    }

    /// Like [`WorkerPool::shutdown`], giving up after `timeout`.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.shutdown()).await {
            Ok(()) => true,
            Err(_) => {
                warn!("Worker pool shutdown timed out after {:?}", timeout);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Jobs queued but not yet picked up by an executor.
    pub fn pending(&self) -> usize {
        self.inner.tx.max_capacity() - self.inner.tx.capacity()
    }

    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }
}

async fn worker_loop(worker_id: usize, inner: Arc<PoolInner>) {
    trace!("Worker {} started", worker_id);

    loop {
        let job = {
            let mut rx = inner.rx.lock().await;
            tokio::select! {
                biased;
                _ = inner.token.cancelled() => None,
                job = rx.recv() => job,
            }
        };
        let Some(job) = job else {
            break;
        };

        debug!("Worker {} executing {}", worker_id, job.kind());
        match job.execute(inner.store.as_ref()).await {
            Ok(()) => {
                inner.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                error!("Worker {} job {} failed: {:#}", worker_id, job.kind(), e);
            }
        }
    }

    trace!("Worker {} stopped", worker_id);
}
