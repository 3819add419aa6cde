//! Judge Client Error Types
//!
//! This module defines [`JudgeError`], which classifies every failure mode of
//! the judge's HTTP surface so that callers can decide what is retriable.
//! Connection-level failures surface as [`JudgeError::Unavailable`] and are
//! retried only by the next reconciliation pass; HTTP 4xx/5xx responses keep
//! their status code so diagnostics reach the submission's `message` field.

use thiserror::Error;

/// Represents all error types that can occur when talking to the judge.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Caller-side validation failure: missing source code, missing language,
    /// or limits exceeding the configured maxima. Detected locally, never
    /// retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport or connection failure reaching the judge.
    #[error("unable to reach judge service: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The judge rejected the request with a 4xx status.
    #[error("judge rejected request ({status}): {body}")]
    Client { status: u16, body: String },

    /// The judge answered with a 5xx status.
    #[error("judge server error ({status})")]
    Server { status: u16 },

    /// The token is unknown to the judge.
    #[error("no judge submission found for token '{0}'")]
    NotFound(String),

    /// The judge answered 2xx but the payload was missing or undecodable.
    #[error("malformed judge response: {0}")]
    BadResponse(String),
}

impl JudgeError {
    /// True for failures that a later reconciliation pass may resolve.
    pub fn is_retriable(&self) -> bool {
        matches!(self, JudgeError::Unavailable(_) | JudgeError::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(JudgeError::Server { status: 503 }.is_retriable());
        assert!(!JudgeError::InvalidRequest("missing source".into()).is_retriable());
        assert!(
            !JudgeError::Client {
                status: 422,
                body: "bad language id".into()
            }
            .is_retriable()
        );
        assert!(!JudgeError::NotFound("tok".into()).is_retriable());
    }
}
