//! Read-only view of question data the grading core consumes.
//!
//! Questions, their ordered test cases, and their execution limits are owned
//! by the question management subsystem; the core only reads them.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use judge::ResourceLimits;

/// One (input, expected output) pair used to verify a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are withheld from student-facing result payloads by the
    /// presentation layer; the core evaluates them like any other.
    pub is_hidden: bool,
    /// Informational; all cases currently weigh equally in the score.
    pub weight: i32,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            is_hidden: false,
            weight: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("question {0} not found")]
    NotFound(i64),
    #[error("question source failure: {0}")]
    Backend(String),
}

/// Question data required for grading.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Test cases in the question's configured order. The order is
    /// significant for deterministic failure logs, not for scoring.
    async fn test_cases(&self, question_id: i64) -> Result<Vec<TestCase>, QuestionError>;

    async fn limits(&self, question_id: i64) -> Result<ResourceLimits, QuestionError>;
}

#[derive(Debug, Clone, Default)]
struct QuestionRecord {
    test_cases: Vec<TestCase>,
    limits: ResourceLimits,
}

/// In-memory question bank for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    questions: Mutex<HashMap<i64, QuestionRecord>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_question(&self, question_id: i64, test_cases: Vec<TestCase>) {
        self.add_question_with_limits(question_id, test_cases, ResourceLimits::default());
    }

    pub fn add_question_with_limits(
        &self,
        question_id: i64,
        test_cases: Vec<TestCase>,
        limits: ResourceLimits,
    ) {
        let mut guard = self.questions.lock().expect("question bank lock poisoned");
        guard.insert(question_id, QuestionRecord { test_cases, limits });
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn test_cases(&self, question_id: i64) -> Result<Vec<TestCase>, QuestionError> {
        let guard = self.questions.lock().expect("question bank lock poisoned");
        guard
            .get(&question_id)
            .map(|q| q.test_cases.clone())
            .ok_or(QuestionError::NotFound(question_id))
    }

    async fn limits(&self, question_id: i64) -> Result<ResourceLimits, QuestionError> {
        let guard = self.questions.lock().expect("question bank lock poisoned");
        guard
            .get(&question_id)
            .map(|q| q.limits)
            .ok_or(QuestionError::NotFound(question_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bank_preserves_case_order() {
        let bank = InMemoryQuestionBank::new();
        bank.add_question(
            1,
            vec![
                TestCase::new("1", "one"),
                TestCase::new("2", "two"),
                TestCase::new("3", "three"),
            ],
        );

        let cases = bank.test_cases(1).await.unwrap();
        let inputs: Vec<&str> = cases.iter().map(|c| c.input.as_str()).collect();
        assert_eq!(inputs, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_unknown_question() {
        let bank = InMemoryQuestionBank::new();
        assert!(matches!(
            bank.test_cases(9).await.unwrap_err(),
            QuestionError::NotFound(9)
        ));
        assert!(matches!(
            bank.limits(9).await.unwrap_err(),
            QuestionError::NotFound(9)
        ));
    }
}
