//! Reconciliation sweep for submissions stranded mid-evaluation.
//!
//! A crash or judge outage between dispatch and finish leaves a submission
//! non-terminal with a judge token it never collected on. The reconciler
//! periodically finds every such submission and refreshes it from the judge,
//! so no submission stays processing forever. Failures on one submission are
//! logged and never stop the sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::error::GraderError;
use crate::evaluator::Evaluator;

/// Outcome counts of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Submissions the sweep looked at.
    pub examined: usize,
    /// Submissions that reached a terminal status during the sweep.
    pub finished: usize,
    /// Submissions whose refresh failed; retried on the next sweep.
    pub failed: usize,
}

pub struct Reconciler {
    evaluator: Arc<Evaluator>,
    period: Duration,
}

impl Reconciler {
    pub fn new(evaluator: Arc<Evaluator>, period: Duration) -> Self {
        Self { evaluator, period }
    }

    pub fn from_env(evaluator: Arc<Evaluator>) -> Self {
        Self::new(
            evaluator,
            Duration::from_secs(util::config::reconcile_interval_secs()),
        )
    }

    /// Runs sweeps forever at the configured period. Intended to be spawned
    /// as a background task and aborted on shutdown.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "reconciler started");
        loop {
            ticker.tick().await;
            match self.reconcile_once().await {
                Ok(stats) if stats.examined > 0 => {
                    info!(
                        examined = stats.examined,
                        finished = stats.finished,
                        failed = stats.failed,
                        "reconciliation sweep done"
                    );
                }
                Ok(_) => debug!("reconciliation sweep found nothing to do"),
                Err(e) => warn!(error = %e, "reconciliation sweep aborted"),
            }
        }
    }

    /// One sweep: refresh every non-terminal submission that holds a judge
    /// token. Per-submission failures are counted, not propagated.
    pub async fn reconcile_once(&self) -> Result<SweepStats, GraderError> {
        let stuck = self
            .evaluator
            .store()
            .find_processing_with_token()
            .await?;

        let mut stats = SweepStats {
            examined: stuck.len(),
            ..Default::default()
        };
        for submission in stuck {
            match self.evaluator.refresh_status(submission.id).await {
                Ok(refreshed) => {
                    if refreshed.status.is_terminal() {
                        stats.finished += 1;
                    }
                }
                Err(e) => {
                    warn!(submission_id = submission.id, error = %e, "refresh failed, will retry next sweep");
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }
}
