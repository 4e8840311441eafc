//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_city() -> String {
    "Houston".into()
}

const fn default_notification_limit() -> usize {
    10
}

fn default_site_url() -> String {
    "http://localhost:8080".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// City pre-filled on the registration form.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Maximum entries kept in the notification feed.
    #[serde(default = "default_notification_limit")]
    pub notification_limit: usize,

    /// Public origin used to build email-verification redirect links.
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_city: default_city(),
            notification_limit: default_notification_limit(),
            site_url: default_site_url(),
        }
    }
}
