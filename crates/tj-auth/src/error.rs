use thiserror::Error;
use tj_baas::BaasError;
use tj_core::{Notice, RoleSet, RoleTag};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("Invalid email or password. Please check your credentials.")]
    InvalidCredentials,

    #[error("Please verify your email address before logging in.")]
    EmailNotConfirmed,

    /// The auth service refused the request for another reason; its message is shown as-is.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to load user profile. Please try again.")]
    ProfileUnavailable,

    #[error("User profile not found. Please register first.")]
    ProfileMissing,

    #[error("This account has no role yet. Please sign up to choose one.")]
    NoRoles,

    /// Sign-in asked for a role the account does not hold.
    #[error("{}", role_not_granted_message(.role, .held))]
    RoleNotGranted { role: RoleTag, held: RoleSet },

    /// A context switch named a role the identity does not hold. The UI only
    /// offers held roles, so this is a programming error.
    #[error("cannot act as {role}: role not held")]
    RoleNotHeld { role: RoleTag },

    /// Form input failed validation; the message is user-facing.
    #[error("{0}")]
    Validation(String),

    #[error("client storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Backend(#[from] BaasError),
}

fn role_not_granted_message(role: &RoleTag, held: &RoleSet) -> String {
    if held.is_empty() {
        format!("This account is not registered as a {role}. Please sign up with the {role} role first.")
    } else {
        format!(
            "This account doesn't have {role} access yet. You currently have: {held}. Would you like to add this role?"
        )
    }
}

impl AuthError {
    /// Text safe to show the viewer. Transport failures never leak through.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(error) if error.is_transport() => {
                "The service is temporarily unavailable. Please try again.".into()
            }
            Self::Backend(error) => error.service_message(),
            Self::Storage(_) => "Could not save your session on this device.".into(),
            other => other.to_string(),
        }
    }

    /// Destructive notice with `title` and [`user_message`](Self::user_message).
    #[must_use]
    pub fn to_notice(&self, title: &str) -> Notice {
        Notice::failure(title, self.user_message())
    }

    /// Map an auth-service rejection from a password sign-in.
    pub(crate) fn from_sign_in(error: BaasError) -> Self {
        match &error {
            BaasError::Auth { message, .. } if message.contains("Invalid login credentials") => {
                Self::InvalidCredentials
            }
            BaasError::Auth { message, .. } if message.contains("Email not confirmed") => {
                Self::EmailNotConfirmed
            }
            BaasError::Auth { message, .. } => Self::Rejected(message.clone()),
            _ => Self::Backend(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_not_granted_lists_held_roles() {
        let err = AuthError::RoleNotGranted {
            role: RoleTag::Worker,
            held: RoleSet::single(RoleTag::Requester),
        };
        assert_eq!(
            err.to_string(),
            "This account doesn't have worker access yet. You currently have: requester. Would you like to add this role?"
        );
    }

    #[test]
    fn role_not_granted_without_roles() {
        let err = AuthError::RoleNotGranted {
            role: RoleTag::Requester,
            held: RoleSet::new(),
        };
        assert!(err.to_string().starts_with("This account is not registered as a requester."));
    }

    #[test]
    fn transport_errors_are_masked() {
        let err = AuthError::Backend(BaasError::Unavailable("connect ECONNREFUSED 10.0.0.3:443".into()));
        let notice = err.to_notice("Login Failed");
        assert!(notice.is_error());
        assert!(!notice.description.contains("ECONNREFUSED"));
    }

    #[test]
    fn sign_in_messages_are_mapped() {
        let invalid = AuthError::from_sign_in(BaasError::Auth {
            status: 400,
            message: "Invalid login credentials".into(),
        });
        assert!(matches!(invalid, AuthError::InvalidCredentials));

        let unconfirmed = AuthError::from_sign_in(BaasError::Auth {
            status: 400,
            message: "Email not confirmed".into(),
        });
        assert!(matches!(unconfirmed, AuthError::EmailNotConfirmed));

        let other = AuthError::from_sign_in(BaasError::Auth {
            status: 429,
            message: "Too many requests".into(),
        });
        assert_eq!(other.user_message(), "Too many requests");
    }
}
