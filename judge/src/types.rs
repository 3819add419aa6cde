//! Wire types for the judge's submit/status surface.
//!
//! Field names follow the judge's JSON contract exactly (`source_code`,
//! `language_id`, `expected_output`, ...). `time` and `wall_time` arrive as
//! decimal strings and are parsed on consumption.

use serde::{Deserialize, Serialize};

/// Judge status ids as reported in `status.id`.
///
/// Ids 1 and 2 mean the execution has not finished yet; everything above 2 is
/// terminal for that execution.
pub mod status {
    pub const IN_QUEUE: i32 = 1;
    pub const PROCESSING: i32 = 2;
    pub const ACCEPTED: i32 = 3;
    pub const WRONG_ANSWER: i32 = 4;
    pub const TIME_LIMIT_EXCEEDED: i32 = 5;
    pub const COMPILATION_ERROR: i32 = 6;
    pub const RUNTIME_ERROR_SIGSEGV: i32 = 7;
    pub const RUNTIME_ERROR_SIGXFSZ: i32 = 8;
    pub const RUNTIME_ERROR_SIGFPE: i32 = 9;
    pub const RUNTIME_ERROR_SIGABRT: i32 = 10;
    pub const RUNTIME_ERROR_NZEC: i32 = 11;
    pub const RUNTIME_ERROR_OTHER: i32 = 12;
    pub const INTERNAL_ERROR: i32 = 13;
    pub const EXEC_FORMAT_ERROR: i32 = 14;
    /// Reported by judge deployments with the extended status table.
    pub const MEMORY_LIMIT_EXCEEDED: i32 = 17;
}

/// Default execution limits applied by the judge when a request carries none.
pub mod defaults {
    pub const CPU_TIME_LIMIT: f32 = 5.0;
    pub const MEMORY_LIMIT_KB: i32 = 128_000;
}

/// Judge language ids for commonly used runtimes.
pub mod languages {
    pub const C_GCC_9: i32 = 50;
    pub const CPP_GCC_9: i32 = 54;
    pub const GO_1_13: i32 = 60;
    pub const JAVA_OPENJDK_13: i32 = 62;
    pub const JAVASCRIPT_NODE_12: i32 = 63;
    pub const PYTHON_3_8: i32 = 71;
    pub const RUST_1_40: i32 = 73;
}

/// Human-readable name for a judge language id.
pub fn language_name(language_id: i32) -> String {
    match language_id {
        languages::C_GCC_9 => "C (GCC 9.2.0)".to_string(),
        languages::CPP_GCC_9 => "C++ (GCC 9.2.0)".to_string(),
        languages::GO_1_13 => "Go (1.13.5)".to_string(),
        languages::JAVA_OPENJDK_13 => "Java (OpenJDK 13.0.1)".to_string(),
        languages::JAVASCRIPT_NODE_12 => "JavaScript (Node.js 12.14.0)".to_string(),
        languages::PYTHON_3_8 => "Python (3.8.1)".to_string(),
        languages::RUST_1_40 => "Rust (1.40.0)".to_string(),
        other => format!("Language {}", other),
    }
}

/// Execution limits a question may impose on its submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time limit in seconds; judge default applies when `None`.
    pub cpu_time_limit: Option<f32>,
    /// Memory limit in KB; judge default applies when `None`.
    pub memory_limit: Option<i32>,
}

/// Request body for dispatching one execution to the judge.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRequest {
    pub source_code: String,
    pub language_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_time_limit: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<i32>,
}

impl SubmissionRequest {
    pub fn new(source_code: impl Into<String>, language_id: i32) -> Self {
        Self {
            source_code: source_code.into(),
            language_id,
            stdin: None,
            expected_output: None,
            cpu_time_limit: None,
            memory_limit: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = Some(expected_output.into());
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.cpu_time_limit = limits.cpu_time_limit;
        self.memory_limit = limits.memory_limit;
        self
    }
}

/// Response to a submission POST; only the token matters to callers.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionResponse {
    pub token: Option<String>,
}

/// The `status` object embedded in a status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: i32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Status and results of one dispatched execution.
///
/// Transient value: consumed immediately to update a submission, never stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeStatus {
    #[serde(default)]
    pub status: Option<StatusInfo>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub exit_signal: Option<i32>,
    /// CPU time in seconds, as a decimal string on the wire.
    #[serde(default)]
    pub time: Option<String>,
    /// Wall clock time in seconds, as a decimal string on the wire.
    #[serde(default)]
    pub wall_time: Option<String>,
    /// Peak memory in KB.
    #[serde(default)]
    pub memory: Option<i64>,
}

impl JudgeStatus {
    /// The judge status id, if the response carried one.
    pub fn status_id(&self) -> Option<i32> {
        self.status.as_ref().map(|s| s.id)
    }

    /// True while the execution is still queued or running (`status.id <= 2`),
    /// or while the judge has not reported a status at all. Callers must not
    /// treat such a result as terminal.
    pub fn is_in_progress(&self) -> bool {
        match self.status_id() {
            Some(id) => id <= status::PROCESSING,
            None => true,
        }
    }

    /// CPU time in seconds, parsed from the wire string.
    pub fn time_secs(&self) -> Option<f64> {
        self.time.as_deref().and_then(|t| t.parse().ok())
    }

    /// Wall clock time in seconds, parsed from the wire string.
    pub fn wall_time_secs(&self) -> Option<f64> {
        self.wall_time.as_deref().and_then(|t| t.parse().ok())
    }
}
