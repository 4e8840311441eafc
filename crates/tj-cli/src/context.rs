use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tj_auth::{FileStorage, RecordingNavigator, Tab};
use tj_baas::HttpBaas;
use tj_baas::token_store::TokenFile;
use tj_config::TjConfig;

/// Everything a command needs: configuration plus one client "tab" backed by
/// the hosted service and the on-disk client state.
pub struct AppContext {
    pub config: TjConfig,
    pub tab: Tab,
    pub navigator: Arc<RecordingNavigator>,
}

impl AppContext {
    pub fn init(config: TjConfig) -> anyhow::Result<Self> {
        let baas_config = config.baas.require()?;
        let storage_path = config
            .session
            .resolved_storage_path()
            .context("no storage path configured and no platform data directory")?;
        let token_path = storage_path.with_file_name("auth.json");

        let baas = HttpBaas::new(
            &baas_config.url,
            &baas_config.anon_key,
            Duration::from_secs(baas_config.request_timeout_secs),
            Duration::from_secs(baas_config.poll_interval_secs),
        )
        .context("failed to build backend client")?
        .with_token_file(TokenFile::new(token_path));

        tracing::debug!(storage = %storage_path.display(), "client state file");
        let navigator = Arc::new(RecordingNavigator::new());
        let tab = Tab::new(
            Arc::new(baas),
            Arc::new(FileStorage::new(storage_path)),
            navigator.clone(),
        );

        Ok(Self {
            config,
            tab,
            navigator,
        })
    }

    /// Path of the last navigation a flow performed.
    pub fn landing(&self) -> Option<String> {
        self.navigator.last().map(|route| route.path())
    }
}
