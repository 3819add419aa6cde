//! Persistence contract for submissions.
//!
//! The grading core does not own a database; it consumes this trait. Saves
//! are compare-and-swap on [`Submission::version`] so the evaluation
//! orchestrator and the reconciliation loop can never silently overwrite each
//! other, even under adversarial scheduling. An in-memory implementation is
//! provided for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::submission::{NewSubmission, Submission};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission {0} not found")]
    NotFound(i64),
    /// The record changed since this copy was loaded. The caller must reload
    /// before trying again; the reconciler simply skips the submission.
    #[error("submission {id} was modified concurrently (held version {held})")]
    VersionConflict { id: i64, held: u64 },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence operations the grading core requires.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persists a new submission and assigns its id.
    async fn insert(&self, params: NewSubmission) -> Result<Submission, StoreError>;

    async fn load(&self, id: i64) -> Result<Submission, StoreError>;

    /// Saves a loaded copy. Fails with [`StoreError::VersionConflict`] when
    /// the stored version differs from the copy's; on success the stored
    /// version is bumped and the fresh copy returned.
    async fn save(&self, submission: Submission) -> Result<Submission, StoreError>;

    /// All submissions that are non-terminal and hold a judge token; feeds
    /// the reconciliation sweep.
    async fn find_processing_with_token(&self) -> Result<Vec<Submission>, StoreError>;

    /// Most recent submission of one user for one question.
    async fn find_latest(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, StoreError>;

    /// Highest-scoring submission of one user for one question; ties go to
    /// the more recent one.
    async fn find_best(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, StoreError>;
}

/// Hash-map backed store used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    submissions: Mutex<HashMap<i64, Submission>>,
    next_id: AtomicI64,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert(&self, params: NewSubmission) -> Result<Submission, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let submission = Submission::create(id, params);
        let mut guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        guard.insert(id, submission.clone());
        Ok(submission)
    }

    async fn load(&self, id: i64) -> Result<Submission, StoreError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        guard.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn save(&self, mut submission: Submission) -> Result<Submission, StoreError> {
        let mut guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        let stored = guard
            .get(&submission.id)
            .ok_or(StoreError::NotFound(submission.id))?;
        if stored.version != submission.version {
            return Err(StoreError::VersionConflict {
                id: submission.id,
                held: submission.version,
            });
        }
        submission.version += 1;
        guard.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_processing_with_token(&self) -> Result<Vec<Submission>, StoreError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        let mut stuck: Vec<Submission> = guard
            .values()
            .filter(|s| s.status.is_processing() && s.judge_token.is_some())
            .cloned()
            .collect();
        stuck.sort_by_key(|s| s.id);
        Ok(stuck)
    }

    async fn find_latest(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        Ok(guard
            .values()
            .filter(|s| s.user_id == user_id && s.question_id == question_id)
            .max_by_key(|s| s.submitted_at)
            .cloned())
    }

    async fn find_best(
        &self,
        user_id: i64,
        question_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store lock poisoned");
        Ok(guard
            .values()
            .filter(|s| s.user_id == user_id && s.question_id == question_id)
            .max_by(|a, b| {
                a.score
                    .total_cmp(&b.score)
                    .then(a.submitted_at.cmp(&b.submitted_at))
            })
            .cloned())
    }
}
