use thiserror::Error;

use crate::ENV_PREFIX;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file or `TJ_*` variable could not be read into [`TjConfig`](crate::TjConfig).
    #[error("failed to load ThoseJobs config: {0}")]
    Load(#[from] figment::Error),

    #[error(
        "[{section}] is missing {}; set it in .thosejobs/config.toml or export {}",
        .missing.join(", "),
        env_keys(.section, .missing)
    )]
    NotConfigured {
        section: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("{} = {value:?} is invalid: {reason}", env_key(.field))]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Environment variable overriding the dotted config key `field`.
#[must_use]
pub fn env_key(field: &str) -> String {
    format!("{ENV_PREFIX}{}", field.replace('.', "__").to_uppercase())
}

fn env_keys(section: &str, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| env_key(&format!("{section}.{field}")))
        .collect::<Vec<_>>()
        .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_follows_figment_split() {
        assert_eq!(env_key("baas.anon_key"), "TJ_BAAS__ANON_KEY");
        assert_eq!(env_key("session.max_token_age_secs"), "TJ_SESSION__MAX_TOKEN_AGE_SECS");
    }

    #[test]
    fn not_configured_names_the_env_keys() {
        let err = ConfigError::NotConfigured {
            section: "baas",
            missing: vec!["url", "anon_key"],
        };
        assert_eq!(
            err.to_string(),
            "[baas] is missing url, anon_key; set it in .thosejobs/config.toml or export \
             TJ_BAAS__URL / TJ_BAAS__ANON_KEY"
        );
    }

    #[test]
    fn invalid_value_shows_the_offending_value() {
        let err = ConfigError::InvalidValue {
            field: "baas.url",
            value: "abcd.supabase.co".into(),
            reason: "expected an http(s) URL".into(),
        };
        assert_eq!(
            err.to_string(),
            "TJ_BAAS__URL = \"abcd.supabase.co\" is invalid: expected an http(s) URL"
        );
    }
}
