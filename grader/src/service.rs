//! Grading service facade.
//!
//! Owns the evaluator, the worker pool, and the background reconciler, and
//! exposes the operations a transport layer calls: submit, fetch, latest,
//! best, and force-refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use judge::Judge;

use crate::error::GraderError;
use crate::evaluator::{EvalConfig, Evaluator};
use crate::pool::{EvalPool, PoolConfig};
use crate::question::QuestionSource;
use crate::reconciler::Reconciler;
use crate::status::Verdict;
use crate::store::SubmissionStore;
use crate::submission::{NewSubmission, Submission};

pub struct GradingService {
    store: Arc<dyn SubmissionStore>,
    questions: Arc<dyn QuestionSource>,
    evaluator: Arc<Evaluator>,
    pool: EvalPool,
    reconciler: JoinHandle<()>,
}

impl GradingService {
    /// Starts the service with configuration from the environment.
    pub fn start(
        judge: Arc<dyn Judge>,
        store: Arc<dyn SubmissionStore>,
        questions: Arc<dyn QuestionSource>,
    ) -> Self {
        Self::start_with(
            judge,
            store,
            questions,
            EvalConfig::from_env(),
            PoolConfig::from_env(),
            Duration::from_secs(util::config::reconcile_interval_secs()),
        )
    }

    pub fn start_with(
        judge: Arc<dyn Judge>,
        store: Arc<dyn SubmissionStore>,
        questions: Arc<dyn QuestionSource>,
        eval_config: EvalConfig,
        pool_config: PoolConfig,
        reconcile_period: Duration,
    ) -> Self {
        let evaluator = Arc::new(Evaluator::new(
            judge,
            Arc::clone(&store),
            Arc::clone(&questions),
            eval_config,
        ));
        let pool = EvalPool::start(Arc::clone(&evaluator), pool_config);
        let reconciler = tokio::spawn(
            Reconciler::new(Arc::clone(&evaluator), reconcile_period).run(),
        );
        info!("grading service started");
        Self {
            store,
            questions,
            evaluator,
            pool,
            reconciler,
        }
    }

    /// Accepts a submission and queues it for evaluation.
    ///
    /// The returned submission is normally `pending`; when the evaluation
    /// queue is full it comes back already finished as `internal_error` so
    /// the caller never holds a submission nobody will evaluate.
    pub async fn submit(&self, params: NewSubmission) -> Result<Submission, GraderError> {
        if params.source_code.trim().is_empty() {
            return Err(GraderError::InvalidSubmission(
                "source code is empty".to_string(),
            ));
        }
        // Resolves the question up front so an unknown id is rejected here
        // rather than surfacing later as an evaluation failure.
        let cases = self.questions.test_cases(params.question_id).await?;

        let mut params = params;
        params.total_test_cases = cases.len() as u32;
        let submission = self.store.insert(params).await?;
        info!(
            submission_id = submission.id,
            user_id = submission.user_id,
            question_id = submission.question_id,
            "submission accepted"
        );

        match self.pool.try_enqueue(submission.id) {
            Ok(()) => Ok(submission),
            Err(_) => {
                warn!(submission_id = submission.id, "evaluation queue full");
                let mut sub = self.store.load(submission.id).await?;
                sub.finish(
                    Verdict::InternalError,
                    Some("evaluation queue full".to_string()),
                );
                Ok(self.store.save(sub).await?)
            }
        }
    }

    pub async fn submission(&self, id: i64) -> Result<Submission, GraderError> {
        Ok(self.store.load(id).await?)
    }

    /// Most recent submission of a user for a question, if any.
    pub async fn latest(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, GraderError> {
        Ok(self.store.find_latest(user_id, question_id).await?)
    }

    /// Highest-scoring submission of a user for a question, if any.
    pub async fn best(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, GraderError> {
        Ok(self.store.find_best(user_id, question_id).await?)
    }

    /// Forces a status refresh from the judge without waiting for the next
    /// reconciliation sweep.
    pub async fn refresh(&self, id: i64) -> Result<Submission, GraderError> {
        self.evaluator.refresh_status(id).await
    }

    /// Stops the reconciler, closes the queue and drains in-flight work.
    pub async fn shutdown(self) {
        self.reconciler.abort();
        self.pool.shutdown().await;
        info!("grading service stopped");
    }
}
