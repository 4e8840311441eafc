//! # tj-config
//!
//! Layered configuration loading for the ThoseJobs client using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TJ_*` prefix, `__` as separator)
//! 2. Project-level `.thosejobs/config.toml`
//! 3. User-level `~/.config/thosejobs/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `TJ_BAAS__URL` -> `baas.url`, `TJ_SESSION__STORAGE_PATH` ->
//! `session.storage_path`, and so on.
//!
//! ```no_run
//! use tj_config::TjConfig;
//!
//! let config = TjConfig::load_with_dotenv().expect("config");
//! if config.baas.is_configured() {
//!     println!("backend: {}", config.baas.url);
//! }
//! ```

mod baas;
mod error;
mod general;
mod session;

pub use baas::BaasConfig;
pub use error::{ConfigError, env_key};
pub use general::GeneralConfig;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment prefix for every override.
pub const ENV_PREFIX: &str = "TJ_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TjConfig {
    #[serde(default)]
    pub baas: BaasConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl TjConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`load_with_dotenv`](Self::load_with_dotenv)
    /// for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".thosejobs/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("thosejobs").join("config.toml"))
    }
}
