//! Backend-as-a-service connection settings.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_request_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BaasConfig {
    /// Project URL (e.g., `https://abcd.supabase.co`).
    #[serde(default)]
    pub url: String,

    /// Public anonymous API key sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,

    /// How often the message change feed is polled, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BaasConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BaasConfig {
    /// Check if the project URL and key are both present.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    /// Fail with `NotConfigured` unless [`is_configured`](Self::is_configured).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` or `ConfigError::InvalidValue` for
    /// a URL without an http(s) scheme.
    pub fn require(&self) -> Result<&Self, ConfigError> {
        let missing: Vec<&'static str> = [("url", &self.url), ("anon_key", &self.anon_key)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "baas",
                missing,
            });
        }
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "baas.url",
                value: self.url.clone(),
                reason: "expected an http(s) URL".into(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = BaasConfig::default();
        assert!(!config.is_configured());
        assert!(matches!(
            config.require(),
            Err(ConfigError::NotConfigured { missing, .. }) if missing == ["url", "anon_key"]
        ));
    }

    #[test]
    fn names_only_the_missing_field() {
        let config = BaasConfig {
            url: "https://abcd.supabase.co".into(),
            ..Default::default()
        };
        let err = config.require().unwrap_err();
        assert!(err.to_string().contains("TJ_BAAS__ANON_KEY"));
        assert!(!err.to_string().contains("TJ_BAAS__URL"));
    }

    #[test]
    fn configured_when_url_and_key_set() {
        let config = BaasConfig {
            url: "https://abcd.supabase.co".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        assert!(config.require().is_ok());
    }

    #[test]
    fn rejects_url_without_scheme() {
        let config = BaasConfig {
            url: "abcd.supabase.co".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.require(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
