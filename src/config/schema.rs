use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Root configuration. Every field has a serde default so a missing or
/// partial config file still yields a working setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub reliability: ReliabilityConfig,
    pub video: VideoConfig,
}

// ─── Provider ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base, no trailing slash.
    pub base_url: String,
    /// Name of the environment variable holding the API key. The key value
    /// itself never lives in the config file.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 120,
        }
    }
}

// ─── Reliability ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityConfig {
    /// Retries after the first attempt; effectively "wait out the provider".
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_factor: f64,
    pub max_backoff_ms: u64,
    /// Substrings (matched case-insensitively against error text) that mark
    /// an error as transient. Provider wording shifts; this is config data,
    /// not code.
    pub retryable_markers: Vec<String>,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            initial_backoff_ms: 1_000,
            backoff_factor: 1.5,
            max_backoff_ms: 10_000,
            retryable_markers: default_retryable_markers(),
        }
    }
}

fn default_retryable_markers() -> Vec<String> {
    [
        "resource_exhausted",
        "rate limit",
        "quota",
        "overloaded",
        "unavailable",
        "limit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ─── Video ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub poll_interval_secs: u64,
    /// Overall ceiling on the poll loop. Unset means poll until the provider
    /// reports a terminal state, matching the provider's own contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_poll_secs: Option<u64>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_poll_secs: None,
        }
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("provider.base_url is empty".into()));
        }
        if self.provider.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "provider.base_url must not end with '/'".into(),
            ));
        }
        if self.reliability.backoff_factor < 1.0 {
            return Err(ConfigError::Validation(
                "reliability.backoff_factor must be >= 1.0".into(),
            ));
        }
        if self.reliability.initial_backoff_ms == 0 {
            return Err(ConfigError::Validation(
                "reliability.initial_backoff_ms must be > 0".into(),
            ));
        }
        if self.reliability.max_backoff_ms < self.reliability.initial_backoff_ms {
            return Err(ConfigError::Validation(
                "reliability.max_backoff_ms must be >= initial_backoff_ms".into(),
            ));
        }
        if self.video.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "video.poll_interval_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn default_backoff_matches_provider_contract() {
        let rel = ReliabilityConfig::default();
        assert_eq!(rel.max_retries, 20);
        assert_eq!(rel.initial_backoff_ms, 1_000);
        assert!((rel.backoff_factor - 1.5).abs() < f64::EPSILON);
        assert_eq!(rel.max_backoff_ms, 10_000);
    }

    #[test]
    fn default_poll_has_no_ceiling() {
        let video = VideoConfig::default();
        assert_eq!(video.poll_interval_secs, 5);
        assert!(video.max_poll_secs.is_none());
    }

    #[test]
    fn rejects_sub_unit_backoff_factor() {
        let mut config = Config::default();
        config.reliability.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_trailing_slash_base_url() {
        let mut config = Config::default();
        config.provider.base_url = "https://example.com/v1/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [reliability]
            max_retries = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.reliability.max_retries, 3);
        assert_eq!(config.reliability.initial_backoff_ms, 1_000);
        assert_eq!(config.video.poll_interval_secs, 5);
    }
}
