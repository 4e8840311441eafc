//! Role-scoped route guard.
//!
//! One [`RouteGuard`] per protected view, parameterized by the role the view
//! requires. A check resolves the live session, loads and normalizes the
//! profile, and either admits the viewer or issues exactly one redirect to the
//! role's login page. Results arriving after the view unmounted are dropped.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tj_baas::RawProfile;
use tj_core::{AccountContext, Identity, RoleSet, RoleTag, Route, Session};

use crate::{Tab, context, roles, session};

/// Liveness of the view that started a check.
#[derive(Debug, Clone)]
pub struct Mount {
    mounted: Arc<AtomicBool>,
}

impl Default for Mount {
    fn default() -> Self {
        Self::new()
    }
}

impl Mount {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub identity: Identity,
    pub context: AccountContext,
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized(Box<Authorized>),
    Unauthorized { redirect: Route },
    /// The view unmounted before the check finished.
    Discarded,
}

impl GuardState {
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    /// Render protected content only when authorized.
    pub fn render<T>(&self, content: impl FnOnce(&Authorized) -> T) -> Option<T> {
        match self {
            Self::Authorized(authorized) => Some(content(authorized)),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Denial {
    NoSession,
    ProfileUnavailable,
    ProfileMissing,
    RoleMissing { held: RoleSet },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => f.write_str("no session"),
            Self::ProfileUnavailable => f.write_str("profile could not be loaded"),
            Self::ProfileMissing => f.write_str("no profile row"),
            Self::RoleMissing { held } => write!(f, "role not held (holds: [{held}])"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    required: RoleTag,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(required: RoleTag) -> Self {
        Self { required }
    }

    #[must_use]
    pub const fn required(&self) -> RoleTag {
        self.required
    }

    /// Run the check for a view mounted as `mount`.
    ///
    /// Never fails: every error path ends in `Unauthorized` with a single
    /// navigation to `/login?role=<required>`, or in `Discarded` with no
    /// side effects at all.
    pub async fn check(&self, tab: &Tab, mount: &Mount) -> GuardState {
        let outcome = self.evaluate(tab).await;

        if !mount.is_mounted() {
            tracing::debug!(required = %self.required, "guard result discarded after unmount");
            return GuardState::Discarded;
        }

        match outcome {
            Ok((session, identity)) => self.admit(tab, session, identity),
            Err(denial) => {
                tracing::info!(required = %self.required, %denial, "access denied");
                let redirect = tab.go(Route::login_for(self.required));
                GuardState::Unauthorized { redirect }
            }
        }
    }

    async fn evaluate(&self, tab: &Tab) -> Result<(Session, Identity), Denial> {
        let session = session::resolve(tab.baas.as_ref())
            .await
            .ok_or(Denial::NoSession)?;

        let profile = match tab.baas.fetch_profile(&session.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Err(Denial::ProfileMissing),
            Err(error) => {
                tracing::warn!(%error, user_id = %session.user_id, "profile fetch failed");
                return Err(Denial::ProfileUnavailable);
            }
        };

        let held = roles::normalize_profile(&profile);
        if !held.contains(self.required) {
            return Err(Denial::RoleMissing { held });
        }
        let identity = identity_from(profile, held, &session);
        Ok((session, identity))
    }

    fn admit(&self, tab: &Tab, session: Session, identity: Identity) -> GuardState {
        let now = Utc::now();
        let cached = tab
            .store
            .save_identity(&identity, now)
            .and_then(|()| tab.store.save_selected_role(self.required))
            .and_then(|()| tab.store.save_session(&session, now));
        if let Err(error) = cached {
            tracing::warn!(%error, "failed to cache identity after guard check");
        }

        let context = match context::resolve(&tab.store, &identity.roles) {
            Ok(Some(context)) => context,
            Ok(None) => AccountContext::new(self.required),
            Err(error) => {
                tracing::warn!(%error, "failed to persist account context");
                context::choose(
                    &identity.roles,
                    tab.store.account_context(),
                    Some(self.required),
                )
                .unwrap_or(AccountContext::new(self.required))
            }
        };

        tracing::debug!(required = %self.required, user_id = %identity.id, %context, "access granted");
        GuardState::Authorized(Box::new(Authorized {
            identity,
            context,
            session,
        }))
    }
}

/// Assemble an identity from a profile row and its normalized roles.
pub(crate) fn identity_from(profile: RawProfile, roles: RoleSet, session: &Session) -> Identity {
    Identity {
        email: profile
            .email
            .or_else(|| session.email.clone())
            .unwrap_or_default(),
        id: profile.id,
        name: profile.name.unwrap_or_default(),
        phone: profile.phone.unwrap_or_default(),
        city: profile.city.unwrap_or_default(),
        roles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_starts_mounted() {
        let mount = Mount::new();
        let clone = mount.clone();
        assert!(clone.is_mounted());
        mount.unmount();
        assert!(!clone.is_mounted());
    }

    #[test]
    fn only_authorized_renders() {
        assert!(GuardState::Checking.render(|_| ()).is_none());
        assert!(
            GuardState::Unauthorized {
                redirect: Route::login_for(RoleTag::Worker)
            }
            .render(|_| ())
            .is_none()
        );
        assert!(GuardState::Discarded.render(|_| ()).is_none());
    }

    #[test]
    fn denial_messages() {
        let denial = Denial::RoleMissing {
            held: RoleSet::single(RoleTag::Requester),
        };
        assert_eq!(denial.to_string(), "role not held (holds: [requester])");
    }
}
