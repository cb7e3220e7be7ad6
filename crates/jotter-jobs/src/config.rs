//! Run configuration for the enrichment job.

use std::time::Duration;

use jotter_core::defaults::{
    CALL_DELAY_SECS, ENV_BLOB_ACCESS_TOKEN, ENV_BLOB_BASE_URL, ENV_BLOB_BUCKET, ENV_DATABASE_URL,
    ENV_GEMINI_API_KEY, ENV_GEMINI_BASE_URL, ENV_GEMINI_MODEL, ENV_GEMINI_TIMEOUT_SECS,
    GEMINI_MODEL, GEMINI_URL, GEN_TIMEOUT_SECS,
};
use jotter_core::{Error, Result, TaskFamily};

/// How the orchestrator runs passes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Time between passes; zero runs a single pass.
    pub interval: Duration,
    /// Spacing between external model calls; zero disables limiting.
    pub delay: Duration,
    /// Call the model but skip every write.
    pub dry_run: bool,
    /// Families to run.
    pub tasks: Vec<TaskFamily>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            delay: Duration::from_secs(CALL_DELAY_SECS),
            dry_run: false,
            tasks: TaskFamily::ALL.to_vec(),
        }
    }
}

impl RunConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskFamily>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn is_continuous(&self) -> bool {
        !self.interval.is_zero()
    }
}

/// Parse a duration given as bare seconds (`30`, `1.5`) or in humantime
/// form (`30s`, `5m`, `1h 30m`).
pub fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs)
            .map_err(|e| format!("invalid duration '{}': {}", value, e));
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid duration '{}': {}", value, e))
}

/// Connection settings read from the environment at startup.
#[derive(Clone, PartialEq)]
pub struct EnvConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_secs: u64,
    pub blob_bucket: String,
    pub blob_base_url: Option<String>,
    pub blob_access_token: Option<String>,
    pub database_url: String,
}

impl EnvConfig {
    /// Read from process environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GEMINI_API_KEY` | (required) | Model provider credential |
    /// | `BLOB_BUCKET` | (required) | Bucket name, or `file:///path` |
    /// | `DATABASE_URL` | (required) | PostgreSQL connection string |
    /// | `GEMINI_MODEL` | `gemini-2.0-flash` | Generation model |
    /// | `GEMINI_BASE_URL` | Google endpoint | Model API base URL |
    /// | `GEMINI_TIMEOUT_SECS` | `120` | Per-request timeout |
    /// | `BLOB_BASE_URL` | Cloud Storage | Bucket API base URL |
    /// | `BLOB_ACCESS_TOKEN` | (none) | Bearer token for bucket downloads |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = [ENV_GEMINI_API_KEY, ENV_BLOB_BUCKET, ENV_DATABASE_URL]
            .into_iter()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };

        let gemini_timeout_secs = match get(ENV_GEMINI_TIMEOUT_SECS) {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("{} must be a number of seconds", ENV_GEMINI_TIMEOUT_SECS))
            })?,
            None => GEN_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key: required(ENV_GEMINI_API_KEY)?,
            gemini_model: get(ENV_GEMINI_MODEL).unwrap_or_else(|| GEMINI_MODEL.to_string()),
            gemini_base_url: get(ENV_GEMINI_BASE_URL).unwrap_or_else(|| GEMINI_URL.to_string()),
            gemini_timeout_secs,
            blob_bucket: required(ENV_BLOB_BUCKET)?,
            blob_base_url: get(ENV_BLOB_BASE_URL),
            blob_access_token: get(ENV_BLOB_ACCESS_TOKEN),
            database_url: required(ENV_DATABASE_URL)?,
        })
    }
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_timeout_secs", &self.gemini_timeout_secs)
            .field("blob_bucket", &self.blob_bucket)
            .field("blob_base_url", &self.blob_base_url)
            .field(
                "blob_access_token",
                &self.blob_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("database_url", &"<redacted>")
            .finish()
    }
}
