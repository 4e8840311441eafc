//! User-facing auth flows.
//!
//! Each navigating flow returns the route it navigated to (or an [`AuthError`]
//! the caller turns into a notice with [`AuthError::to_notice`]). Flows write client
//! storage only through [`ClientStore`](crate::ClientStore) and publish at most
//! one auth event.
//!
//! [`AuthError`]: crate::AuthError
//! [`AuthError::to_notice`]: crate::AuthError::to_notice

pub mod login;
pub mod logout;
pub mod profile;
pub mod register;
pub mod verify;

pub use login::{LoginOutcome, sign_in};
pub use logout::logout;
pub use profile::{ProfileForm, update_profile};
pub use register::{RegisterFlow, RegisterOutcome, RegistrationForm, choose_role, signup_role};
pub use verify::{VerificationLink, verify_email_link};

use crate::Tab;

/// Drop a session a failed flow created.
pub(crate) async fn abandon_session(tab: &Tab) {
    if let Err(error) = tab.baas.sign_out().await {
        tracing::warn!(%error, "failed to sign out abandoned session");
    }
}
