//! Integration tests for layered configuration loading.
//!
//! Uses figment::Jail for sandboxed env var and working-directory changes.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use tj_config::TjConfig;

#[test]
fn loads_baas_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[baas]
url = "https://abcd.supabase.co"
anon_key = "anon-key"
poll_interval_secs = 2
"#,
        )?;

        let config: TjConfig = Figment::from(Serialized::defaults(TjConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.baas.url, "https://abcd.supabase.co");
        assert_eq!(config.baas.anon_key, "anon-key");
        assert_eq!(config.baas.poll_interval_secs, 2);
        assert_eq!(config.baas.request_timeout_secs, 15);
        assert!(config.baas.is_configured());
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_figment_chain() {
    Jail::expect_with(|jail| {
        jail.create_dir(".thosejobs")?;
        jail.create_file(
            ".thosejobs/config.toml",
            r#"
[session]
storage_path = "state/session.json"
max_token_age_secs = 600

[general]
default_city = "Austin"
"#,
        )?;

        let config: TjConfig = TjConfig::figment().extract()?;
        assert_eq!(config.session.storage_path, "state/session.json");
        assert_eq!(config.session.max_token_age_secs, 600);
        assert_eq!(config.general.default_city, "Austin");
        assert_eq!(config.general.notification_limit, 10);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".thosejobs")?;
        jail.create_file(
            ".thosejobs/config.toml",
            r#"
[baas]
url = "https://from-file.supabase.co"
anon_key = "file-key"
"#,
        )?;
        jail.set_env("TJ_BAAS__URL", "https://from-env.supabase.co");
        jail.set_env("TJ_GENERAL__NOTIFICATION_LIMIT", "25");

        let config: TjConfig = TjConfig::figment().extract()?;
        assert_eq!(config.baas.url, "https://from-env.supabase.co");
        assert_eq!(config.baas.anon_key, "file-key");
        assert_eq!(config.general.notification_limit, 25);
        Ok(())
    });
}

#[test]
fn malformed_value_is_reported() {
    Jail::expect_with(|jail| {
        jail.set_env("TJ_BAAS__POLL_INTERVAL_SECS", "soon");
        let err = TjConfig::load().expect_err("non-numeric interval must fail");
        assert!(err.to_string().starts_with("Configuration error"));
        Ok(())
    });
}
