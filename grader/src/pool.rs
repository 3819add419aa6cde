//! Bounded evaluation worker pool.
//!
//! Accepted submissions are queued on a bounded channel and drained by a
//! fixed set of workers, so a burst of submissions cannot spawn an unbounded
//! number of concurrent judge dispatches. When the queue is full, enqueueing
//! fails fast with [`GraderError::QueueFull`] and the caller decides what to
//! do with the submission.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::GraderError;
use crate::evaluator::Evaluator;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Self {
        Self {
            workers: util::config::eval_workers(),
            queue_capacity: util::config::eval_queue_capacity(),
        }
    }
}

/// Handle to a running set of evaluation workers.
pub struct EvalPool {
    tx: mpsc::Sender<i64>,
    handles: Vec<JoinHandle<()>>,
}

impl EvalPool {
    /// Spawns the workers and returns the pool handle.
    pub fn start(evaluator: Arc<Evaluator>, config: PoolConfig) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            handles.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&evaluator),
                Arc::clone(&rx),
            )));
        }
        info!(workers, queue_capacity = config.queue_capacity, "evaluation pool started");
        Self { tx, handles }
    }

    /// Queues a submission for evaluation without waiting for capacity.
    pub fn try_enqueue(&self, submission_id: i64) -> Result<(), GraderError> {
        self.tx
            .try_send(submission_id)
            .map_err(|_| GraderError::QueueFull)
    }

    /// Closes the queue and waits for in-flight evaluations to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("evaluation pool stopped");
    }
}

async fn worker_loop(worker_id: usize, evaluator: Arc<Evaluator>, rx: Arc<Mutex<mpsc::Receiver<i64>>>) {
    loop {
        // Hold the lock only for the recv so workers drain the queue in
        // parallel.
        let next = { rx.lock().await.recv().await };
        let Some(submission_id) = next else { break };

        debug!(worker_id, submission_id, "worker picked up submission");
        if let Err(e) = evaluator.evaluate(submission_id).await {
            error!(worker_id, submission_id, error = %e, "evaluation failed to record its outcome");
        }
    }
    debug!(worker_id, "evaluation worker exiting");
}
