//! Client runtime configuration.
//!
//! Resolved once at process startup and passed into the HTTP client and session store. Core code
//! never reads environment variables itself.

use crate::constants::DEFAULT_TIMEOUT_SECS;
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoints, session location and timeouts for one client process.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    server_url: String,
    api_url: String,
    transcribe_url: String,
    analyze_url: String,
    session_file: PathBuf,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// URLs must be absolute `http`/`https` URLs with a host; a trailing `/` is dropped so paths
    /// can be appended directly.
    pub fn new(
        server_url: &str,
        api_url: &str,
        transcribe_url: &str,
        analyze_url: &str,
        session_file: PathBuf,
        request_timeout: Duration,
    ) -> CoreResult<Self> {
        if session_file.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("session_file cannot be empty".into()));
        }
        if request_timeout.is_zero() {
            return Err(CoreError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            server_url: validate_base_url("server_url", server_url)?,
            api_url: validate_base_url("api_url", api_url)?,
            transcribe_url: validate_base_url("transcribe_url", transcribe_url)?,
            analyze_url: validate_base_url("analyze_url", analyze_url)?,
            session_file,
            request_timeout,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn transcribe_url(&self) -> &str {
        &self.transcribe_url
    }

    pub fn analyze_url(&self) -> &str {
        &self.analyze_url
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn validate_base_url(name: &str, raw: &str) -> CoreResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| CoreError::InvalidConfig(format!("{name} must start with http:// or https://")))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidConfig(format!("{name} has no valid host: {raw}")));
    }

    Ok(trimmed.to_owned())
}

/// Parse the request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let secs = match value {
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| CoreError::InvalidConfig(format!("timeout must be whole seconds: {v}")))?,
        None => DEFAULT_TIMEOUT_SECS,
    };

    Ok(Duration::from_secs(secs))
}
