use chrono::Utc;
use tj_baas::ProfilePatch;
use tj_core::{RoleTag, Route};

use crate::{Tab, roles};

/// Tokens carried by an email-verification link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLink {
    pub access_token: String,
    pub refresh_token: String,
    pub kind: String,
}

impl VerificationLink {
    /// Read the tokens from the query string or the fragment; the query wins
    /// when both carry a key. `None` unless all three are present and the
    /// link is a sign-up confirmation.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let (rest, fragment) = url.split_once('#').unwrap_or((url, ""));
        let query = rest.split_once('?').map_or("", |(_, query)| query);

        let lookup = |key: &str| param(query, key).or_else(|| param(fragment, key));
        let link = Self {
            access_token: lookup("access_token")?,
            refresh_token: lookup("refresh_token")?,
            kind: lookup("type")?,
        };
        (link.kind == "signup").then_some(link)
    }
}

fn param(pairs: &str, key: &str) -> Option<String> {
    pairs
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Complete an email verification from the link the viewer followed.
///
/// Lands on the verification-success page for the account's primary role,
/// or on `/login` when anything goes wrong.
pub async fn verify_email_link(tab: &Tab, url: &str) -> Route {
    let Some(link) = VerificationLink::parse(url) else {
        tracing::info!("verification link incomplete or not a sign-up link");
        return tab.go(Route::Login { role: None });
    };

    let session = match tab
        .baas
        .set_session(&link.access_token, &link.refresh_token)
        .await
    {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!(%error, "verification tokens rejected");
            return tab.go(Route::Login { role: None });
        }
    };

    let role = match tab.baas.fetch_profile(&session.user_id).await {
        Ok(profile) => profile
            .and_then(|profile| roles::normalize_profile(&profile).primary())
            .unwrap_or(RoleTag::Requester),
        Err(error) => {
            tracing::warn!(%error, user_id = %session.user_id, "profile fetch failed after verification");
            return tab.go(Route::Login { role: None });
        }
    };

    let touch = ProfilePatch::default().touched(Utc::now());
    if let Err(error) = tab.baas.update_profile(&session.user_id, &touch).await {
        tracing::warn!(%error, user_id = %session.user_id, "failed to touch profile after verification");
    }

    tracing::info!(user_id = %session.user_id, %role, "email verified");
    tab.go(Route::EmailVerificationSuccess { role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_fragment_tokens() {
        let link = VerificationLink::parse(
            "https://thosejobs.example/auth/callback#access_token=a.b.c&refresh_token=r1&type=signup",
        )
        .unwrap();
        assert_eq!(link.access_token, "a.b.c");
        assert_eq!(link.refresh_token, "r1");
    }

    #[test]
    fn query_wins_over_fragment() {
        let link = VerificationLink::parse(
            "/cb?access_token=q&type=signup#access_token=f&refresh_token=r&type=recovery",
        )
        .unwrap();
        assert_eq!(link.access_token, "q");
        assert_eq!(link.kind, "signup");
    }

    #[test]
    fn decodes_values() {
        let link =
            VerificationLink::parse("/cb?access_token=a%2Bb&refresh_token=r&type=signup").unwrap();
        assert_eq!(link.access_token, "a+b");
    }

    #[test]
    fn rejects_incomplete_or_other_kinds() {
        assert!(VerificationLink::parse("/cb?access_token=a&type=signup").is_none());
        assert!(VerificationLink::parse("/cb#access_token=a&refresh_token=r&type=recovery").is_none());
        assert!(VerificationLink::parse("/cb").is_none());
    }
}
