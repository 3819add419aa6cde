//! Submission lifecycle states.
//!
//! A submission moves `Pending -> Evaluating -> Finished(verdict)` and never
//! leaves a finished state. The judge's intermediate states (in queue,
//! processing) are poll-loop internal and never persisted on a submission;
//! they map to `Evaluating`.

use serde::{Deserialize, Serialize};

use judge::types::status as judge_status;

/// Terminal outcome of an evaluated submission.
///
/// Runtime-error sub-kinds reported by the judge (signal, NZEC, other)
/// collapse into [`Verdict::RuntimeError`]; the sub-kind detail lives in the
/// submission's `message` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    CompilationError,
    RuntimeError,
    InternalError,
}

impl Verdict {
    /// Maps a judge status id to a verdict.
    ///
    /// Returns `None` for ids that mean the execution is still in flight
    /// (queued/processing); unknown ids map to `InternalError`, matching the
    /// judge's own fallback.
    pub fn from_judge_status(status_id: i32) -> Option<Verdict> {
        match status_id {
            judge_status::IN_QUEUE | judge_status::PROCESSING => None,
            judge_status::ACCEPTED => Some(Verdict::Accepted),
            judge_status::WRONG_ANSWER => Some(Verdict::WrongAnswer),
            judge_status::TIME_LIMIT_EXCEEDED => Some(Verdict::TimeLimitExceeded),
            judge_status::COMPILATION_ERROR => Some(Verdict::CompilationError),
            judge_status::RUNTIME_ERROR_SIGSEGV..=judge_status::RUNTIME_ERROR_OTHER => {
                Some(Verdict::RuntimeError)
            }
            judge_status::MEMORY_LIMIT_EXCEEDED => Some(Verdict::MemoryLimitExceeded),
            _ => Some(Verdict::InternalError),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::MemoryLimitExceeded => "memory_limit_exceeded",
            Verdict::CompilationError => "compilation_error",
            Verdict::RuntimeError => "runtime_error",
            Verdict::InternalError => "internal_error",
        };
        write!(f, "{}", s)
    }
}

/// Detail string for a judge status id, used when collapsing runtime-error
/// sub-kinds into one reported kind.
pub fn describe_judge_status(status_id: i32) -> &'static str {
    match status_id {
        judge_status::IN_QUEUE => "In Queue",
        judge_status::PROCESSING => "Processing",
        judge_status::ACCEPTED => "Accepted",
        judge_status::WRONG_ANSWER => "Wrong Answer",
        judge_status::TIME_LIMIT_EXCEEDED => "Time Limit Exceeded",
        judge_status::COMPILATION_ERROR => "Compilation Error",
        judge_status::RUNTIME_ERROR_SIGSEGV => "Runtime Error (SIGSEGV)",
        judge_status::RUNTIME_ERROR_SIGXFSZ => "Runtime Error (SIGXFSZ)",
        judge_status::RUNTIME_ERROR_SIGFPE => "Runtime Error (SIGFPE)",
        judge_status::RUNTIME_ERROR_SIGABRT => "Runtime Error (SIGABRT)",
        judge_status::RUNTIME_ERROR_NZEC => "Runtime Error (NZEC)",
        judge_status::RUNTIME_ERROR_OTHER => "Runtime Error (Other)",
        judge_status::INTERNAL_ERROR => "Internal Error",
        judge_status::EXEC_FORMAT_ERROR => "Exec Format Error",
        judge_status::MEMORY_LIMIT_EXCEEDED => "Memory Limit Exceeded",
        _ => "Unknown",
    }
}

/// Represents the status of a submission throughout its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "verdict", rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Created, no test case dispatched yet.
    Pending,
    /// At least one test case in flight.
    Evaluating,
    /// Terminal; no transition leaves this state.
    Finished(Verdict),
}

impl SubmissionStatus {
    /// True only for `Pending`/`Evaluating`. This predicate governs what the
    /// reconciliation loop resumes.
    pub fn is_processing(&self) -> bool {
        matches!(self, SubmissionStatus::Pending | SubmissionStatus::Evaluating)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_processing()
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            SubmissionStatus::Finished(verdict) => Some(*verdict),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict() == Some(Verdict::Accepted)
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Evaluating => write!(f, "evaluating"),
            SubmissionStatus::Finished(verdict) => write!(f, "{}", verdict),
        }
    }
}
