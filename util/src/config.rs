//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Base URL of the judge service, e.g. `http://judge-server:2358`.
    pub judge_url: String,
    /// Optional API key sent as `X-Auth-Token` on every judge request.
    pub judge_api_key: String,
    pub judge_connect_timeout_secs: u64,
    pub judge_timeout_secs: u64,
    /// Highest CPU time limit (seconds) a submission request may carry.
    pub max_cpu_time_limit: f32,
    /// Highest memory limit (KB) a submission request may carry.
    pub max_memory_limit_kb: i32,
    /// Delay between status polls for one dispatched test case.
    pub poll_interval_ms: u64,
    /// Poll attempts before a test case is declared timed out.
    pub poll_max_attempts: u32,
    /// How often the reconciliation sweep runs.
    pub reconcile_interval_secs: u64,
    /// Number of concurrent evaluation workers.
    pub eval_workers: usize,
    /// Capacity of the pending-evaluation queue.
    pub eval_queue_capacity: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. Values that
    /// are missing fall back to defaults suitable for local development.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "grading-engine".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "grader=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            judge_url: env::var("JUDGE_URL").unwrap_or_else(|_| "http://localhost:2358".into()),
            judge_api_key: env::var("JUDGE_API_KEY").unwrap_or_default(),
            judge_connect_timeout_secs: env::var("JUDGE_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            judge_timeout_secs: env::var("JUDGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            max_cpu_time_limit: env::var("MAX_CPU_TIME_LIMIT")
                .unwrap_or_else(|_| "15.0".into())
                .parse()
                .unwrap_or(15.0),
            max_memory_limit_kb: env::var("MAX_MEMORY_LIMIT_KB")
                .unwrap_or_else(|_| "512000".into())
                .parse()
                .unwrap_or(512_000),
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".into())
                .parse()
                .unwrap_or(1000),
            poll_max_attempts: env::var("POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            eval_workers: env::var("EVAL_WORKERS")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .unwrap_or(4),
            eval_queue_capacity: env::var("EVAL_QUEUE_CAPACITY")
                .unwrap_or_else(|_| "256".into())
                .parse()
                .unwrap_or(256),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_judge_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.judge_url = value.into());
    }

    pub fn set_judge_api_key(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.judge_api_key = value.into());
    }

    pub fn set_poll_interval_ms(value: u64) {
        AppConfig::set_field(|cfg| cfg.poll_interval_ms = value);
    }

    pub fn set_poll_max_attempts(value: u32) {
        AppConfig::set_field(|cfg| cfg.poll_max_attempts = value);
    }

    pub fn set_reconcile_interval_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.reconcile_interval_secs = value);
    }

    pub fn set_eval_workers(value: usize) {
        AppConfig::set_field(|cfg| cfg.eval_workers = value);
    }

    pub fn set_eval_queue_capacity(value: usize) {
        AppConfig::set_field(|cfg| cfg.eval_queue_capacity = value);
    }
}

// --- Free accessor functions used at call sites ---

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn judge_url() -> String {
    AppConfig::global().judge_url.clone()
}

pub fn judge_api_key() -> String {
    AppConfig::global().judge_api_key.clone()
}

pub fn judge_connect_timeout_secs() -> u64 {
    AppConfig::global().judge_connect_timeout_secs
}

pub fn judge_timeout_secs() -> u64 {
    AppConfig::global().judge_timeout_secs
}

pub fn max_cpu_time_limit() -> f32 {
    AppConfig::global().max_cpu_time_limit
}

pub fn max_memory_limit_kb() -> i32 {
    AppConfig::global().max_memory_limit_kb
}

pub fn poll_interval_ms() -> u64 {
    AppConfig::global().poll_interval_ms
}

pub fn poll_max_attempts() -> u32 {
    AppConfig::global().poll_max_attempts
}

pub fn reconcile_interval_secs() -> u64 {
    AppConfig::global().reconcile_interval_secs
}

pub fn eval_workers() -> usize {
    AppConfig::global().eval_workers
}

pub fn eval_queue_capacity() -> usize {
    AppConfig::global().eval_queue_capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_override_global() {
        AppConfig::set_poll_interval_ms(5);
        AppConfig::set_eval_workers(2);
        AppConfig::set_judge_url("http://judge.test:2358");

        assert_eq!(poll_interval_ms(), 5);
        assert_eq!(eval_workers(), 2);
        assert_eq!(judge_url(), "http://judge.test:2358");

        AppConfig::reset();
    }
}
