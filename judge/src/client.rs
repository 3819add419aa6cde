//! HTTP client for the judge service.
//!
//! [`Judge0Client`] wraps the judge's submit/status/delete/health surface and
//! normalizes every failure into the [`JudgeError`] taxonomy. The client is
//! stateless between calls; one instance can be shared across tasks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tracing::{debug, warn};

use crate::error::JudgeError;
use crate::types::{JudgeStatus, SubmissionRequest, SubmissionResponse, defaults};

/// Fields requested on a status poll when the caller does not need the
/// submitted source echoed back.
const STATUS_FIELDS: &str = "stdout,stderr,compile_output,message,exit_code,exit_signal,\
                             status,created_at,finished_at,time,wall_time,memory,token";

/// Connection settings for the judge service.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Base URL, e.g. `http://judge-server:2358`.
    pub base_url: String,
    /// API key sent as `X-Auth-Token` when non-empty.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Highest CPU time limit (seconds) a request may carry.
    pub max_cpu_time_limit: f32,
    /// Highest memory limit (KB) a request may carry.
    pub max_memory_limit_kb: i32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:2358".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            // 3x / 4x the judge's own defaults.
            max_cpu_time_limit: 3.0 * defaults::CPU_TIME_LIMIT,
            max_memory_limit_kb: 4 * defaults::MEMORY_LIMIT_KB,
        }
    }
}

impl JudgeConfig {
    /// Loads connection settings from the global application config.
    pub fn from_env() -> Self {
        let api_key = util::config::judge_api_key();
        Self {
            base_url: util::config::judge_url(),
            api_key: (!api_key.trim().is_empty()).then_some(api_key),
            connect_timeout: Duration::from_secs(util::config::judge_connect_timeout_secs()),
            timeout: Duration::from_secs(util::config::judge_timeout_secs()),
            max_cpu_time_limit: util::config::max_cpu_time_limit(),
            max_memory_limit_kb: util::config::max_memory_limit_kb(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Asynchronous interface to the judge.
///
/// The orchestrator and tests depend on this trait rather than on the
/// concrete HTTP client.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Dispatches one execution and returns the opaque token identifying it.
    async fn submit(&self, request: &SubmissionRequest) -> Result<String, JudgeError>;

    /// Fetches the current status/result for a dispatched execution.
    ///
    /// A result with `status.id <= 2` is still in progress and must not be
    /// treated as terminal.
    async fn get_status(
        &self,
        token: &str,
        include_source: bool,
    ) -> Result<JudgeStatus, JudgeError>;

    /// Deletes a dispatched execution. Unknown tokens are treated as already
    /// deleted, so deletion is idempotent.
    async fn delete(&self, token: &str) -> Result<(), JudgeError>;

    /// Health probe. All failures are swallowed and reported as `false`.
    async fn is_available(&self) -> bool;
}

/// Reqwest-backed judge client.
#[derive(Debug, Clone)]
pub struct Judge0Client {
    client: reqwest::Client,
    config: JudgeConfig,
}

impl Judge0Client {
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(JudgeError::Unavailable)?;

        Ok(Self { client, config })
    }

    /// Builds a client from the global application config.
    pub fn from_env() -> Result<Self, JudgeError> {
        Self::new(JudgeConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(key) = &self.config.api_key {
            builder = builder.header("X-Auth-Token", key);
        }
        builder
    }

    /// Rejects requests the judge would refuse, without a network call.
    fn validate(&self, request: &SubmissionRequest) -> Result<(), JudgeError> {
        if request.source_code.trim().is_empty() {
            return Err(JudgeError::InvalidRequest(
                "source code cannot be empty".to_string(),
            ));
        }
        if let Some(cpu) = request.cpu_time_limit {
            if cpu > self.config.max_cpu_time_limit {
                return Err(JudgeError::InvalidRequest(format!(
                    "cpu time limit {}s exceeds maximum {}s",
                    cpu, self.config.max_cpu_time_limit
                )));
            }
        }
        if let Some(memory) = request.memory_limit {
            if memory > self.config.max_memory_limit_kb {
                return Err(JudgeError::InvalidRequest(format!(
                    "memory limit {}KB exceeds maximum {}KB",
                    memory, self.config.max_memory_limit_kb
                )));
            }
        }
        Ok(())
    }

    /// Maps non-2xx responses onto the error taxonomy.
    async fn check_response(response: Response) -> Result<Response, JudgeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.is_server_error() {
            return Err(JudgeError::Server {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(JudgeError::Client {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Judge for Judge0Client {
    async fn submit(&self, request: &SubmissionRequest) -> Result<String, JudgeError> {
        self.validate(request)?;
        debug!(language_id = request.language_id, "submitting code to judge");

        let response = self
            .request(reqwest::Method::POST, "/submissions")
            .query(&[("base64_encoded", "false"), ("wait", "false")])
            .json(request)
            .send()
            .await
            .map_err(JudgeError::Unavailable)?;

        let response = Self::check_response(response).await?;
        let body: SubmissionResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::BadResponse(e.to_string()))?;

        let token = body
            .token
            .ok_or_else(|| JudgeError::BadResponse("missing token".to_string()))?;

        debug!(%token, "judge accepted submission");
        Ok(token)
    }

    async fn get_status(
        &self,
        token: &str,
        include_source: bool,
    ) -> Result<JudgeStatus, JudgeError> {
        if token.trim().is_empty() {
            return Err(JudgeError::InvalidRequest(
                "token cannot be empty".to_string(),
            ));
        }

        let fields = if include_source { "*" } else { STATUS_FIELDS };
        let response = self
            .request(reqwest::Method::GET, &format!("/submissions/{}", token))
            .query(&[("base64_encoded", "false"), ("fields", fields)])
            .send()
            .await
            .map_err(JudgeError::Unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(JudgeError::NotFound(token.to_string()));
        }

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| JudgeError::BadResponse(e.to_string()))
    }

    async fn delete(&self, token: &str) -> Result<(), JudgeError> {
        if token.trim().is_empty() {
            return Err(JudgeError::InvalidRequest(
                "token cannot be empty".to_string(),
            ));
        }

        let response = self
            .request(reqwest::Method::DELETE, &format!("/submissions/{}", token))
            .send()
            .await
            .map_err(JudgeError::Unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%token, "judge submission already deleted");
            return Ok(());
        }

        Self::check_response(response).await?;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.request(reqwest::Method::GET, "/about").send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "judge service is not available");
                false
            }
        }
    }
}
