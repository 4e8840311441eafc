//! Client session persistence settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const fn default_max_token_age_secs() -> u64 {
    60 * 60 * 24
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// File holding the persisted client state. Empty means the platform data dir.
    #[serde(default)]
    pub storage_path: String,

    /// Stored tokens older than this are treated as stale, in seconds.
    #[serde(default = "default_max_token_age_secs")]
    pub max_token_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: String::new(),
            max_token_age_secs: default_max_token_age_secs(),
        }
    }
}

impl SessionConfig {
    /// Explicit `storage_path`, or `<data_dir>/thosejobs/session.json`.
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        if !self.storage_path.is_empty() {
            return Some(PathBuf::from(&self.storage_path));
        }
        dirs::data_dir().map(|dir| dir.join("thosejobs").join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let config = SessionConfig {
            storage_path: "/tmp/tj/state.json".into(),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_storage_path(),
            Some(PathBuf::from("/tmp/tj/state.json"))
        );
    }

    #[test]
    fn default_path_ends_with_session_file() {
        let config = SessionConfig::default();
        if let Some(path) = config.resolved_storage_path() {
            assert!(path.ends_with("thosejobs/session.json"));
        }
        assert_eq!(config.max_token_age_secs, 86_400);
    }
}
