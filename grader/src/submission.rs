//! The submission record and its guarded transitions.
//!
//! A submission is created `Pending`, is mutated only by the evaluation
//! orchestrator and the reconciliation loop, and ends in exactly one terminal
//! verdict. All lifecycle mutation goes through methods so the invariants
//! hold: `finished_at` is set iff the status is terminal, and it is set
//! exactly once; `test_cases_passed` never exceeds `total_test_cases`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use judge::JudgeStatus;

use crate::status::{SubmissionStatus, Verdict};

/// Parameters for creating a submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: i64,
    pub question_id: i64,
    pub source_code: String,
    pub language_id: i32,
    /// Fixed at creation from the question's test-case count.
    pub total_test_cases: u32,
}

/// Represents a user's submission for a specific question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Primary key of the submission.
    pub id: i64,
    /// ID of the user who submitted the code.
    pub user_id: i64,
    /// ID of the question being answered.
    pub question_id: i64,
    /// Submitted source; immutable after creation.
    pub source_code: String,
    /// Language/runtime id in the judge's catalog.
    pub language_id: i32,
    /// Token of the first dispatched test case; resumption key for the
    /// reconciliation loop.
    pub judge_token: Option<String>,
    /// Current status of the submission in the lifecycle.
    pub status: SubmissionStatus,
    /// Per-test-case evaluation log.
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub message: Option<String>,
    pub exit_code: Option<i32>,
    /// CPU time in seconds of the most recently copied judge result.
    pub time: Option<f64>,
    /// Wall clock time in seconds of the most recently copied judge result.
    pub wall_time: Option<f64>,
    /// Peak memory in KB of the most recently copied judge result.
    pub memory: Option<i64>,
    pub test_cases_passed: u32,
    pub total_test_cases: u32,
    /// Derived: passed/total * 100, in [0, 100]; 0 when total is 0.
    pub score: f32,
    /// Timestamp when the submission was created.
    pub submitted_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub last_updated: DateTime<Utc>,
    /// Set exactly once, on the first transition into a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter; the store compare-and-swaps on it.
    pub version: u64,
}

impl Submission {
    /// Builds a fresh `Pending` submission. The store assigns the id.
    pub fn create(id: i64, params: NewSubmission) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: params.user_id,
            question_id: params.question_id,
            source_code: params.source_code,
            language_id: params.language_id,
            judge_token: None,
            status: SubmissionStatus::Pending,
            stdout: None,
            stderr: None,
            compile_output: None,
            message: None,
            exit_code: None,
            time: None,
            wall_time: None,
            memory: None,
            test_cases_passed: 0,
            total_test_cases: params.total_test_cases,
            score: 0.0,
            submitted_at: now,
            last_updated: now,
            finished_at: None,
            version: 0,
        }
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Pending -> Evaluating; happens exactly once, when the orchestrator
    /// dispatches the first test case.
    pub fn mark_evaluating(&mut self) {
        if self.status == SubmissionStatus::Pending {
            self.status = SubmissionStatus::Evaluating;
            self.touch();
        }
    }

    /// Moves the submission into a terminal verdict. `finished_at` is set
    /// only on the first terminal transition; later calls keep the original
    /// completion time and verdict.
    pub fn finish(&mut self, verdict: Verdict, message: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SubmissionStatus::Finished(verdict);
        if let Some(message) = message {
            self.message = Some(message);
        }
        self.finished_at = Some(Utc::now());
        self.touch();
    }

    /// Replaces the recorded verdict with the whole-run aggregate.
    ///
    /// [`Submission::finish`] never leaves a terminal state, which is right
    /// for every writer except the evaluator's own final result: a status
    /// refresh that fires mid-evaluation finishes the submission from the
    /// first case's result alone, and the aggregate must win that race.
    /// `finished_at` keeps the first terminal transition's time.
    pub fn supersede_verdict(&mut self, verdict: Verdict) {
        self.status = SubmissionStatus::Finished(verdict);
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        self.touch();
    }

    /// Copies a judge result's diagnostic fields onto the submission.
    ///
    /// `stdout` is deliberately not copied: the submission's stdout carries
    /// the per-test-case evaluation log instead.
    pub fn apply_judge_result(&mut self, result: &JudgeStatus) {
        self.stderr = result.stderr.clone();
        self.compile_output = result.compile_output.clone();
        self.message = result.message.clone();
        self.exit_code = result.exit_code;
        self.time = result.time_secs();
        self.wall_time = result.wall_time_secs();
        self.memory = result.memory;
        self.touch();
    }

    /// Records the pass count and recomputes the score.
    pub fn record_passes(&mut self, passed: u32) {
        self.test_cases_passed = passed.min(self.total_test_cases);
        self.score = score_percentage(self.test_cases_passed, self.total_test_cases);
        self.touch();
    }

    /// Appends one line to the evaluation log kept in `stdout`.
    pub fn append_output_log(&mut self, line: &str) {
        let log = self.stdout.get_or_insert_with(String::new);
        log.push_str(line);
        log.push('\n');
        self.touch();
    }
}

/// Score as a percentage of passed test cases; 0 when there are none.
pub fn score_percentage(passed: u32, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (passed as f32 / total as f32) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge::types::StatusInfo;

    fn new_submission() -> Submission {
        Submission::create(
            1,
            NewSubmission {
                user_id: 7,
                question_id: 3,
                source_code: "print(42)".to_string(),
                language_id: 71,
                total_test_cases: 4,
            },
        )
    }

    #[test]
    fn test_created_pending_without_finish_time() {
        let sub = new_submission();
        assert_eq!(sub.status, SubmissionStatus::Pending);
        assert!(sub.finished_at.is_none());
        assert_eq!(sub.score, 0.0);
        assert_eq!(sub.version, 0);
    }

    /// finished_at is non-null iff the status is terminal.
    #[test]
    fn test_finish_sets_finished_at_exactly_once() {
        let mut sub = new_submission();
        sub.mark_evaluating();
        assert!(sub.finished_at.is_none());

        sub.finish(Verdict::Accepted, None);
        let finished_at = sub.finished_at.expect("terminal submission needs finished_at");
        assert!(sub.status.is_terminal());

        // A second finish must not move the completion time or the verdict.
        sub.finish(Verdict::InternalError, Some("late error".to_string()));
        assert_eq!(sub.finished_at, Some(finished_at));
        assert_eq!(sub.status, SubmissionStatus::Finished(Verdict::Accepted));
        assert!(sub.message.is_none());
    }

    #[test]
    fn test_supersede_verdict_replaces_premature_finish() {
        let mut sub = new_submission();
        sub.mark_evaluating();
        sub.finish(Verdict::Accepted, None);
        let first_finish = sub.finished_at;

        sub.supersede_verdict(Verdict::WrongAnswer);
        assert_eq!(sub.status, SubmissionStatus::Finished(Verdict::WrongAnswer));
        assert_eq!(sub.finished_at, first_finish);
    }

    #[test]
    fn test_mark_evaluating_only_from_pending() {
        let mut sub = new_submission();
        sub.finish(Verdict::InternalError, Some("boom".to_string()));
        sub.mark_evaluating();
        assert!(sub.status.is_terminal());
    }

    #[test]
    fn test_record_passes_clamps_and_scores() {
        let mut sub = new_submission();
        sub.record_passes(3);
        assert_eq!(sub.test_cases_passed, 3);
        assert_eq!(sub.score, 75.0);

        sub.record_passes(99);
        assert_eq!(sub.test_cases_passed, 4);
        assert_eq!(sub.score, 100.0);
    }

    #[test]
    fn test_score_percentage_zero_total() {
        assert_eq!(score_percentage(0, 0), 0.0);
        assert_eq!(score_percentage(2, 3), 200.0 / 3.0);
    }

    #[test]
    fn test_apply_judge_result_skips_stdout() {
        let mut sub = new_submission();
        sub.append_output_log("Test Case 1: PASSED");

        let result = JudgeStatus {
            status: Some(StatusInfo {
                id: 3,
                description: None,
            }),
            stdout: Some("42\n".to_string()),
            stderr: Some("warning".to_string()),
            time: Some("0.01".to_string()),
            memory: Some(1024),
            ..Default::default()
        };
        sub.apply_judge_result(&result);

        assert_eq!(sub.stdout.as_deref(), Some("Test Case 1: PASSED\n"));
        assert_eq!(sub.stderr.as_deref(), Some("warning"));
        assert_eq!(sub.time, Some(0.01));
        assert_eq!(sub.memory, Some(1024));
    }
}
