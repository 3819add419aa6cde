//! Client for the external sandboxed code-execution service ("the judge").
//!
//! The judge compiles and runs submitted source against provided stdin and
//! reports stdout/stderr/resource usage/status. This crate exposes the
//! [`Judge`] trait over its submit/status/delete/health HTTP surface, a
//! reqwest-backed [`Judge0Client`] implementation, the wire DTOs, and the
//! [`JudgeError`] taxonomy the grading core keys its handling on.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Judge, Judge0Client, JudgeConfig};
pub use error::JudgeError;
pub use types::{
    JudgeStatus, ResourceLimits, StatusInfo, SubmissionRequest, SubmissionResponse, language_name,
};
