use tj_core::Route;

use crate::error::AuthError;
use crate::notifier::AuthEvent;
use crate::Tab;

/// Sign out and forget everything cached about the viewer.
///
/// The auth service is asked to end the session, but a failure there does not
/// stop the local sign-out. Exactly one [`AuthEvent::AuthStateChanged`] is
/// published and the viewer lands on the home view.
///
/// # Errors
///
/// Returns `AuthError::Storage` if some client key could not be removed. The
/// event and navigation still happen.
pub async fn logout(tab: &Tab) -> Result<Route, AuthError> {
    if let Err(error) = tab.baas.sign_out().await {
        tracing::warn!(%error, "auth service sign-out failed; clearing local state anyway");
    }
    let cleared = tab.store.clear();
    tab.notifier.publish(AuthEvent::AuthStateChanged);
    let route = tab.go(Route::Home);
    tracing::info!("signed out");
    cleared.map(|()| route)
}
