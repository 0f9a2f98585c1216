use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub server_host: String,
    pub server_port: u16,
    pub refresh_interval_ms: u64,
    pub usage_estimator_endpoint: String,
    pub emails_endpoint: String,
    pub ownership_db_path: PathBuf,
    pub request_timeout_secs: u64,
    /// Usage percentage at which a warning email is scheduled. `None` disables warnings.
    pub warning_threshold_percent: Option<u8>,
    pub log_level: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8184,
            refresh_interval_ms: 60_000,
            usage_estimator_endpoint: "http://127.0.0.1:8185".to_string(),
            emails_endpoint: "http://127.0.0.1:8186".to_string(),
            ownership_db_path: PathBuf::from("data/rate-limit/ownership.db"),
            request_timeout_secs: 10,
            warning_threshold_percent: None,
            log_level: "info".to_string(),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("RATE_LIMIT_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("RATE_LIMIT_PORT") {
            cfg.server_port = port.parse().context("RATE_LIMIT_PORT must be a valid u16")?;
        }
        if let Ok(interval) = env::var("RATE_LIMIT_INTERVAL_MS") {
            cfg.refresh_interval_ms = interval
                .parse()
                .context("RATE_LIMIT_INTERVAL_MS must be a positive integer")?;
        }
        if let Ok(endpoint) = env::var("USAGE_ESTIMATOR_ENDPOINT") {
            cfg.usage_estimator_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("EMAILS_ENDPOINT") {
            cfg.emails_endpoint = endpoint;
        }
        if let Ok(path) = env::var("OWNERSHIP_DB_PATH") {
            cfg.ownership_db_path = PathBuf::from(path);
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout_secs = timeout
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?;
        }
        if let Ok(threshold) = env::var("WARNING_THRESHOLD_PERCENT") {
            cfg.warning_threshold_percent = parse_threshold(&threshold)
                .with_context(|| format!("WARNING_THRESHOLD_PERCENT is invalid: {threshold}"))?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            anyhow::bail!("RATE_LIMIT_INTERVAL_MS must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if self.usage_estimator_endpoint.trim().is_empty() {
            anyhow::bail!("USAGE_ESTIMATOR_ENDPOINT cannot be empty");
        }
        if self.emails_endpoint.trim().is_empty() {
            anyhow::bail!("EMAILS_ENDPOINT cannot be empty");
        }
        if let Some(threshold) = self.warning_threshold_percent {
            if threshold == 0 || threshold >= 100 {
                anyhow::bail!("WARNING_THRESHOLD_PERCENT must be between 1 and 99");
            }
        }
        if let Some(parent) = self.ownership_db_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}

fn parse_threshold(value: &str) -> Result<Option<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    let percent: u8 = trimmed.parse().context("expected an integer percentage")?;
    Ok(Some(percent))
}
