//! Evaluation orchestrator.
//!
//! Drives one submission through all of its test cases: dispatches each case
//! to the judge, polls until the judge reports a terminal status, aggregates
//! pass/fail into a score, and finishes the submission with a verdict. Also
//! provides [`Evaluator::refresh_status`], the resumption primitive the
//! reconciliation loop uses to repair submissions whose evaluation was cut
//! short.
//!
//! Test cases of a single submission run strictly sequentially; distinct
//! submissions may evaluate concurrently without coordination because they
//! share no mutable state. Every internal failure is converted at this
//! boundary into a terminal `internal_error` submission, never a crash.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use judge::types::status as judge_status;
use judge::{Judge, JudgeStatus, SubmissionRequest};

use crate::error::GraderError;
use crate::question::{QuestionSource, TestCase};
use crate::status::{Verdict, describe_judge_status};
use crate::store::{StoreError, SubmissionStore};
use crate::submission::Submission;

/// Polling knobs for one dispatched test case.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Poll attempts before the test case is declared timed out.
    pub poll_max_attempts: u32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            poll_max_attempts: 30,
        }
    }
}

impl EvalConfig {
    /// Loads polling knobs from the global application config.
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_millis(util::config::poll_interval_ms()),
            poll_max_attempts: util::config::poll_max_attempts(),
        }
    }
}

/// Runs submissions to completion against the judge.
pub struct Evaluator {
    judge: Arc<dyn Judge>,
    store: Arc<dyn SubmissionStore>,
    questions: Arc<dyn QuestionSource>,
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(
        judge: Arc<dyn Judge>,
        store: Arc<dyn SubmissionStore>,
        questions: Arc<dyn QuestionSource>,
        config: EvalConfig,
    ) -> Self {
        Self {
            judge,
            store,
            questions,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    /// Evaluates one submission end to end.
    ///
    /// Any error below this call is converted into a terminal
    /// `internal_error` submission with a diagnostic message; the returned
    /// error is limited to storage failures while recording that outcome.
    pub async fn evaluate(&self, submission_id: i64) -> Result<Submission, GraderError> {
        let submission = self.store.load(submission_id).await?;
        if submission.status.is_terminal() {
            debug!(submission_id, "submission already terminal, skipping");
            return Ok(submission);
        }

        match self.run_evaluation(submission).await {
            Ok(submission) => Ok(submission),
            Err(e) => {
                error!(submission_id, error = %e, "evaluation aborted");
                self.fail_submission(
                    submission_id,
                    format!("internal error during evaluation: {}", e),
                )
                .await
            }
        }
    }

    async fn run_evaluation(&self, mut sub: Submission) -> Result<Submission, GraderError> {
        let cases = self.questions.test_cases(sub.question_id).await?;
        if cases.is_empty() {
            warn!(
                submission_id = sub.id,
                question_id = sub.question_id,
                "question has no test cases"
            );
            sub.total_test_cases = 0;
            sub.record_passes(0);
            sub.finish(
                Verdict::InternalError,
                Some("no test cases configured".to_string()),
            );
            return Ok(self.store.save(sub).await?);
        }
        let limits = self.questions.limits(sub.question_id).await?;

        sub.total_test_cases = cases.len() as u32;
        sub.mark_evaluating();
        let mut sub = self.store.save(sub).await?;

        let mut passed = 0u32;
        for (index, case) in cases.iter().enumerate() {
            let request = SubmissionRequest::new(sub.source_code.clone(), sub.language_id)
                .with_stdin(case.input.clone())
                .with_expected_output(case.expected_output.clone())
                .with_limits(limits);

            let token = self.judge.submit(&request).await?;
            let result = self.poll_for_result(&token).await?;

            // The submission keeps the token and result fields of the first
            // dispatched case; later cases only contribute pass/fail, and
            // their judge-side records are cleaned up best effort.
            if sub.judge_token.is_none() {
                sub.judge_token = Some(token);
                sub.apply_judge_result(&result);
                sub = self.store.save(sub).await?;
            } else if let Err(e) = self.judge.delete(&token).await {
                debug!(submission_id = sub.id, %token, error = %e, "cleanup of judge record failed");
            }

            let case_passed = case_passes(case, &result);
            if case_passed {
                passed += 1;
            }
            sub.append_output_log(&format!(
                "Test Case {}: {}",
                index + 1,
                if case_passed { "PASSED" } else { "FAILED" }
            ));
            if !case_passed {
                if let Some(stderr) = result.stderr.as_deref().filter(|s| !s.trim().is_empty()) {
                    sub.append_output_log(&format!("Error: {}", stderr));
                }
            }
        }

        sub.record_passes(passed);
        let verdict = if passed == cases.len() as u32 {
            Verdict::Accepted
        } else {
            Verdict::WrongAnswer
        };
        sub.finish(verdict, None);

        let submission_id = sub.id;
        let total = sub.total_test_cases;
        let log = sub.stdout.clone();
        let sub = match self.store.save(sub).await {
            Ok(sub) => sub,
            // A reconciliation sweep can catch this submission between the
            // first-case save and here, and finish it from the first case's
            // result alone. The whole-run aggregate is authoritative, so
            // reapply it on the fresh copy instead of conceding the race.
            Err(StoreError::VersionConflict { .. }) => {
                warn!(
                    submission_id,
                    "final result raced a concurrent status refresh, reapplying aggregate"
                );
                let mut fresh = self.store.load(submission_id).await?;
                fresh.total_test_cases = total;
                fresh.stdout = log;
                fresh.record_passes(passed);
                fresh.supersede_verdict(verdict);
                self.store.save(fresh).await?
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            submission_id = sub.id,
            passed = sub.test_cases_passed,
            total = sub.total_test_cases,
            score = sub.score,
            verdict = %sub.status,
            "submission evaluation completed"
        );
        Ok(sub)
    }

    /// Polls the judge until the execution leaves the queued/processing
    /// states, up to the configured attempt ceiling.
    async fn poll_for_result(&self, token: &str) -> Result<JudgeStatus, GraderError> {
        for _ in 0..self.config.poll_max_attempts {
            let result = self.judge.get_status(token, false).await?;
            if !result.is_in_progress() {
                return Ok(result);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
        Err(GraderError::PollTimeout {
            attempts: self.config.poll_max_attempts,
        })
    }

    /// Refreshes a submission from the judge using its stored token.
    ///
    /// Used by the reconciliation loop and the force-refresh path. A
    /// submission without a token has nothing to refresh and is returned
    /// unchanged; a judge failure downgrades the submission to
    /// `internal_error` instead of leaving it stuck.
    pub async fn refresh_status(&self, submission_id: i64) -> Result<Submission, GraderError> {
        let mut sub = self.store.load(submission_id).await?;

        let Some(token) = sub.judge_token.clone() else {
            debug!(submission_id, "no judge token, nothing to refresh");
            return Ok(sub);
        };
        if sub.status.is_terminal() {
            return Ok(sub);
        }

        match self.judge.get_status(&token, false).await {
            Ok(result) => {
                if result.is_in_progress() {
                    debug!(submission_id, %token, "judge still processing");
                    return Ok(sub);
                }
                // Not in progress implies a status id above the processing
                // range, so a verdict always exists.
                let status_id = result.status_id().unwrap_or(judge_status::INTERNAL_ERROR);
                let verdict =
                    Verdict::from_judge_status(status_id).unwrap_or(Verdict::InternalError);

                sub.apply_judge_result(&result);
                let detail = (sub.message.is_none() && verdict != Verdict::Accepted)
                    .then(|| describe_judge_status(status_id).to_string());
                sub.finish(verdict, detail);
                let sub = self.store.save(sub).await?;

                info!(
                    submission_id,
                    verdict = %sub.status,
                    "submission refreshed from judge"
                );
                Ok(sub)
            }
            Err(e) => {
                warn!(submission_id, error = %e, "status refresh failed");
                sub.finish(
                    Verdict::InternalError,
                    Some(format!("error refreshing status from judge: {}", e)),
                );
                Ok(self.store.save(sub).await?)
            }
        }
    }

    /// Records a fatal evaluation failure on the submission. Retries once on
    /// a version conflict so the diagnostic is not lost to a concurrent
    /// writer that left the submission non-terminal.
    async fn fail_submission(
        &self,
        submission_id: i64,
        message: String,
    ) -> Result<Submission, GraderError> {
        let mut retried = false;
        loop {
            let mut sub = self.store.load(submission_id).await?;
            if sub.status.is_terminal() {
                return Ok(sub);
            }
            sub.finish(Verdict::InternalError, Some(message.clone()));
            match self.store.save(sub).await {
                Ok(sub) => return Ok(sub),
                Err(StoreError::VersionConflict { .. }) if !retried => retried = true,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// A test case passes iff the judge accepted the execution and the trimmed
/// stdout equals the trimmed expected output exactly (case-sensitive,
/// whitespace-insensitive only at the two ends).
fn case_passes(case: &TestCase, result: &JudgeStatus) -> bool {
    result.status_id() == Some(judge_status::ACCEPTED)
        && result.stdout.as_deref().unwrap_or("").trim() == case.expected_output.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge::types::StatusInfo;

    fn accepted_with_stdout(stdout: &str) -> JudgeStatus {
        JudgeStatus {
            status: Some(StatusInfo {
                id: judge_status::ACCEPTED,
                description: None,
            }),
            stdout: Some(stdout.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_case_passes_trims_both_ends_only() {
        let case = TestCase::new("", "hello world");
        assert!(case_passes(&case, &accepted_with_stdout("hello world\n")));
        assert!(case_passes(&case, &accepted_with_stdout("  hello world  ")));
        // Interior whitespace is significant.
        assert!(!case_passes(&case, &accepted_with_stdout("hello  world")));
        // Comparison is case-sensitive.
        assert!(!case_passes(&case, &accepted_with_stdout("Hello World")));
    }

    #[test]
    fn test_case_fails_on_non_accepted_status() {
        let case = TestCase::new("", "out");
        let mut result = accepted_with_stdout("out");
        result.status = Some(StatusInfo {
            id: judge_status::TIME_LIMIT_EXCEEDED,
            description: None,
        });
        assert!(!case_passes(&case, &result));
    }

    #[test]
    fn test_missing_stdout_matches_empty_expectation() {
        let case = TestCase::new("", "");
        let mut result = accepted_with_stdout("");
        result.stdout = None;
        assert!(case_passes(&case, &result));
    }
}
