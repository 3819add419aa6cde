//! Grading core error type.
//!
//! Everything here is caught at the orchestrator boundary and converted into
//! a terminal `internal_error` submission state with a human-readable
//! message; none of these propagate as crashes.

use thiserror::Error;

use crate::question::QuestionError;
use crate::store::StoreError;
use judge::JudgeError;

#[derive(Debug, Error)]
pub enum GraderError {
    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Question(#[from] QuestionError),

    /// The poll ceiling was reached without a terminal judge status. Fatal
    /// for the current test case.
    #[error("timed out waiting for judge result after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    /// Caller-side rejection raised before a submission is evaluated.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// The evaluation queue is at capacity.
    #[error("evaluation queue is full")]
    QueueFull,
}
