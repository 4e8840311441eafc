use chrono::Utc;
use tj_core::{AccountContext, Identity, Notice, RoleTag, Route};

use crate::error::AuthError;
use crate::guard::identity_from;
use crate::notifier::AuthEvent;
use crate::{Tab, context, roles};

use super::abandon_session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub context: AccountContext,
    pub route: Route,
    pub notice: Notice,
}

/// Password sign-in, optionally for a specific role's form.
///
/// On success the session, identity, and selected role are persisted and the
/// account context is re-resolved, so a held preference outranks the hint.
/// One [`AuthEvent::AuthStateChanged`] is published and the viewer is sent to
/// the selected role's dashboard.
///
/// # Errors
///
/// Credential and confirmation failures map to their own variants. A role
/// hint the account does not hold yields `AuthError::RoleNotGranted`; the
/// session created by the attempt is signed out again in that case.
pub async fn sign_in(
    tab: &Tab,
    email: &str,
    password: &str,
    role_hint: Option<RoleTag>,
) -> Result<LoginOutcome, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Please enter your email and password.".into(),
        ));
    }

    let session = tab
        .baas
        .sign_in_with_password(email, password)
        .await
        .map_err(AuthError::from_sign_in)?;

    let profile = match tab.baas.fetch_profile(&session.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            abandon_session(tab).await;
            return Err(AuthError::ProfileMissing);
        }
        Err(error) => {
            tracing::warn!(%error, user_id = %session.user_id, "profile fetch failed during login");
            abandon_session(tab).await;
            return Err(AuthError::ProfileUnavailable);
        }
    };

    let held = roles::normalize_profile(&profile);
    let selected = match (role_hint, held.primary()) {
        (Some(role), _) if held.contains(role) => role,
        (Some(role), _) => {
            abandon_session(tab).await;
            return Err(AuthError::RoleNotGranted { role, held });
        }
        (None, Some(primary)) => primary,
        (None, None) => {
            abandon_session(tab).await;
            return Err(AuthError::NoRoles);
        }
    };

    let identity = identity_from(profile, held, &session);
    let now = Utc::now();
    tab.store.save_session(&session, now)?;
    tab.store.save_identity(&identity, now)?;
    tab.store.save_selected_role(selected)?;
    let context = context::resolve(&tab.store, &identity.roles)?
        .unwrap_or(AccountContext::new(selected));

    tracing::info!(user_id = %identity.id, %selected, %context, "signed in");
    tab.notifier.publish(AuthEvent::AuthStateChanged);

    let notice = Notice::success(
        "Welcome back!",
        format!("Signed in as {} ({}).", display_name(&identity), selected.label()),
    );
    let route = tab.go(Route::Dashboard(selected));
    Ok(LoginOutcome {
        identity,
        context,
        route,
        notice,
    })
}

fn display_name(identity: &Identity) -> &str {
    if identity.name.trim().is_empty() {
        &identity.email
    } else {
        &identity.name
    }
}
