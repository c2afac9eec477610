use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::{DEFAULT_MAX_RETRIES, PolicyError, RetryPolicy};
use crate::error::PrismaError;
use crate::prismacloud::PrismaClient;

pub const DEFAULT_API_URL: &str = "https://api.prismacloud.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Retry knobs exposed to users (`backoff_retry`, `max_retries`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub backoff_retry: bool,
    pub max_retries: i64,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            backoff_retry: false,
            max_retries: i64::from(DEFAULT_MAX_RETRIES),
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl RetrySettings {
    /// Policy for reads. A single attempt unless `backoff_retry` is on.
    pub fn policy(&self) -> Result<RetryPolicy, PolicyError> {
        if self.backoff_retry {
            self.polling_policy()
        } else {
            Ok(RetryPolicy::single_attempt())
        }
    }

    /// Policy used after a create, where polling always happens.
    pub fn polling_policy(&self) -> Result<RetryPolicy, PolicyError> {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))?
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

/// Provider settings, read from a JSON file and overridden by flags/env.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub customer_name: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            username: None,
            password: None,
            customer_name: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetrySettings::default(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("customer_name", &self.customer_name)
            .field("token", &redact(&self.token))
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Builds an API client, logging in unless a session token is configured.
    pub async fn connect(&self) -> Result<PrismaClient, PrismaError> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(PrismaClient::with_timeout(
                token.clone(),
                self.url.clone(),
                self.timeout(),
            )?);
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(PrismaClient::login(
                &self.url,
                username,
                password,
                self.customer_name.as_deref(),
                self.timeout(),
            )
            .await?),
            _ => Err(PrismaError::Config(
                "No credentials provided. Set PRISMACLOUD_TOKEN, or PRISMACLOUD_USERNAME and PRISMACLOUD_PASSWORD"
                    .to_string(),
            )),
        }
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("prismacloud").join("config.json"))
}

pub fn load(path: &Path) -> Result<ProviderConfig, PrismaError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| PrismaError::Config(format!("{}: {}", path.display(), e)))
}

/// An explicit path must exist; the default location is optional.
pub fn load_or_default(path: Option<&Path>) -> Result<ProviderConfig, PrismaError> {
    if let Some(path) = path {
        return load(path);
    }

    match default_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading provider config");
            load(&path)
        }
        _ => Ok(ProviderConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.url, "https://api.prismacloud.io");
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(90)));
        assert!(!cfg.retry.backoff_retry);
        assert_eq!(cfg.retry.max_retries, 10);
    }

    #[test]
    fn test_retry_defaults_agree() {
        let settings = RetrySettings::default();
        let lookup = crate::resources::UserRoleLookup::default();
        assert_eq!(settings.max_retries, lookup.max_retries);
        assert_eq!(
            settings.polling_policy().unwrap().max_retries(),
            RetryPolicy::default().max_retries()
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"url": "https://api2.prismacloud.io", "username": "key", "retry": {{"backoff_retry": true}}}}"#
        )
        .unwrap();

        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.url, "https://api2.prismacloud.io");
        assert_eq!(cfg.username.as_deref(), Some("key"));
        assert!(cfg.password.is_none());
        assert!(cfg.retry.backoff_retry);
        assert_eq!(cfg.retry.max_retries, 10);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, PrismaError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_path_is_io_error() {
        let err = load_or_default(Some(Path::new("/nonexistent/prismacloud.json"))).unwrap_err();
        assert!(matches!(err, PrismaError::Io(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cfg = ProviderConfig {
            password: Some("hunter2".to_string()),
            token: Some("jwt-secret".to_string()),
            ..ProviderConfig::default()
        };
        let debug_output = format!("{:?}", cfg);
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("jwt-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_retry_policy_toggle() {
        let mut settings = RetrySettings::default();
        assert_eq!(settings.policy().unwrap().max_attempts(), 1);
        assert_eq!(settings.polling_policy().unwrap().max_retries(), 10);

        settings.backoff_retry = true;
        settings.max_retries = 3;
        let policy = settings.policy().unwrap();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_negative_retries_rejected() {
        let settings = RetrySettings {
            backoff_retry: true,
            max_retries: -5,
            ..RetrySettings::default()
        };
        assert_eq!(settings.policy(), Err(PolicyError::NegativeRetries(-5)));
    }

    #[tokio::test]
    async fn test_connect_without_credentials() {
        let cfg = ProviderConfig::default();
        let err = cfg.connect().await.unwrap_err();
        assert!(matches!(err, PrismaError::Config(_)));
    }

    #[tokio::test]
    async fn test_connect_with_token_skips_login() {
        let cfg = ProviderConfig {
            token: Some("session".to_string()),
            url: "http://127.0.0.1:9".to_string(),
            ..ProviderConfig::default()
        };
        let client = cfg.connect().await.unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:9");
    }
}
