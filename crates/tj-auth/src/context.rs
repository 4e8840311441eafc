//! Account-context selection.
//!
//! A multi-role identity acts as exactly one role at a time. The choice is
//! made once per resolution in a fixed order and persisted, so every view in
//! every tab agrees on it.

use tj_core::{AccountContext, RoleSet, RoleTag, Route};

use crate::error::AuthError;
use crate::notifier::AuthEvent;
use crate::store::ClientStore;
use crate::Tab;

/// Pick the active context for `roles`.
///
/// 1. a single held role wins outright
/// 2. a stored preference, if still held
/// 3. the role hint from the last sign-in, if held
/// 4. otherwise the primary role
///
/// `None` only when `roles` is empty.
#[must_use]
pub fn choose(
    roles: &RoleSet,
    preference: Option<AccountContext>,
    hint: Option<RoleTag>,
) -> Option<AccountContext> {
    if let Some(only) = roles.sole() {
        return Some(AccountContext::new(only));
    }
    preference
        .map(AccountContext::role)
        .filter(|role| roles.contains(*role))
        .or_else(|| hint.filter(|role| roles.contains(*role)))
        .or_else(|| roles.primary())
        .map(AccountContext::new)
}

/// Choose from the stored preference and hint, then persist the result.
///
/// # Errors
///
/// Returns `AuthError::Storage` if the choice cannot be persisted.
pub fn resolve(store: &ClientStore, roles: &RoleSet) -> Result<Option<AccountContext>, AuthError> {
    let preference = store.account_context();
    let chosen = choose(roles, preference, store.selected_role());
    if let Some(context) = chosen {
        if preference != Some(context) {
            tracing::debug!(%context, ?preference, "account context selected");
        }
        store.save_account_context(context)?;
    }
    Ok(chosen)
}

/// Held roles other than `current` that the viewer may switch to.
#[must_use]
pub fn switch_targets(roles: &RoleSet, current: AccountContext) -> Vec<RoleTag> {
    roles.iter().filter(|role| *role != current.role()).collect()
}

/// Make `target` the active context and return to the home view.
///
/// Publishes exactly one [`AuthEvent::AuthStateChanged`].
///
/// # Errors
///
/// `AuthError::RoleNotHeld` if the cached role set lacks `target`; nothing is
/// written in that case. `AuthError::Storage` if persisting fails.
pub fn switch(tab: &Tab, target: RoleTag) -> Result<Route, AuthError> {
    let roles = tab.store.roles();
    if !roles.contains(target) {
        tracing::error!(%target, held = %roles, "context switch to a role that is not held");
        return Err(AuthError::RoleNotHeld { role: target });
    }
    tab.store.save_account_context(AccountContext::new(target))?;
    tab.store.save_selected_role(target)?;
    tracing::info!(%target, "switched account context");
    tab.notifier.publish(AuthEvent::AuthStateChanged);
    Ok(tab.go(Route::Home))
}
