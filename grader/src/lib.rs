//! Submission grading core.
//!
//! Accepts code submissions, runs them against a question's test cases via
//! the external judge, scores the outcome, and keeps every submission moving
//! toward a terminal state even across crashes and judge outages.
//!
//! [`GradingService`] is the entry point; everything else is reachable from
//! it: the [`evaluator`] drives individual submissions, the [`pool`] bounds
//! concurrency, and the [`reconciler`] repairs submissions stranded
//! mid-evaluation.

pub mod error;
pub mod evaluator;
pub mod pool;
pub mod question;
pub mod reconciler;
pub mod service;
pub mod status;
pub mod store;
pub mod submission;

pub use error::GraderError;
pub use evaluator::{EvalConfig, Evaluator};
pub use pool::{EvalPool, PoolConfig};
pub use question::{InMemoryQuestionBank, QuestionError, QuestionSource, TestCase};
pub use reconciler::{Reconciler, SweepStats};
pub use service::GradingService;
pub use status::{SubmissionStatus, Verdict};
pub use store::{InMemorySubmissionStore, StoreError, SubmissionStore};
pub use submission::{NewSubmission, Submission};
