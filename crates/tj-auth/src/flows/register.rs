use chrono::Utc;
use serde::{Deserialize, Serialize};
use tj_baas::{NewProfile, ProfilePatch, SignUpMetadata, SignUpRequest};
use tj_core::{Notice, RoleTag, Route};

use crate::error::AuthError;
use crate::{Tab, roles};

use super::abandon_session;

const MIN_PASSWORD_LEN: usize = 6;

/// Sign-up form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    /// Blank means the configured default city.
    #[serde(default)]
    pub city: String,
}

impl RegistrationForm {
    /// Every problem with the form, in field order.
    #[must_use]
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("Please enter your full name.");
        }
        let email = self.email.trim();
        if email.is_empty() {
            problems.push("Please enter your email address.");
        } else if !looks_like_email(email) {
            problems.push("Please enter a valid email address.");
        }
        if self.phone.trim().is_empty() {
            problems.push("Please enter your phone number.");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push("Password must be at least 6 characters.");
        }
        if self.password != self.confirm_password {
            problems.push("Passwords do not match.");
        }
        problems
    }

    /// # Errors
    ///
    /// `AuthError::Validation` carrying the first problem found.
    pub fn validate(&self) -> Result<(), AuthError> {
        match self.problems().first() {
            Some(problem) => Err(AuthError::Validation((*problem).into())),
            None => Ok(()),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub user_id: String,
    /// The email already had an account; the role was added to it.
    pub existing_account: bool,
    pub route: Route,
    pub notice: Notice,
}

/// Registration with the deployment-specific bits filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFlow {
    site_url: String,
    default_city: String,
}

impl RegisterFlow {
    pub fn new(site_url: impl Into<String>, default_city: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_owned(),
            default_city: default_city.into(),
        }
    }

    /// Where the verification email sends a new `role` account.
    #[must_use]
    pub fn verification_redirect(&self, role: RoleTag) -> String {
        format!(
            "{}{}",
            self.site_url,
            Route::EmailVerificationSuccess { role }.path()
        )
    }

    /// Register `form` for `role`, or add `role` to the existing account.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` for bad input (nothing is sent to the
    /// backend); backend failures otherwise.
    pub async fn register(
        &self,
        tab: &Tab,
        form: &RegistrationForm,
        role: RoleTag,
    ) -> Result<RegisterOutcome, AuthError> {
        form.validate()?;
        let email = form.email.trim();
        let city = if form.city.trim().is_empty() {
            self.default_city.clone()
        } else {
            form.city.trim().to_owned()
        };

        let existing = match tab.baas.sign_in_with_password(email, &form.password).await {
            Ok(session) => Some(session.user_id),
            Err(error) if error.is_transport() => return Err(error.into()),
            Err(_) => None,
        };

        let outcome = match existing {
            Some(user_id) => {
                let added = self.add_role(tab, &user_id, form, &city, role).await;
                abandon_session(tab).await;
                let notice = if added? {
                    Notice::success(
                        format!("{} role added!", role.label()),
                        format!("You can now log in as a {role}."),
                    )
                } else {
                    Notice::success(
                        "Already registered",
                        format!("You already have the {role} role. Please log in."),
                    )
                };
                RegisterOutcome {
                    user_id,
                    existing_account: true,
                    route: Route::login_for(role),
                    notice,
                }
            }
            None => {
                let user_id = self.create_account(tab, form, email, &city, role).await?;
                RegisterOutcome {
                    user_id,
                    existing_account: false,
                    route: Route::login_for(role),
                    notice: Notice::success("Account created!", welcome_text(role)),
                }
            }
        };

        tracing::info!(
            user_id = %outcome.user_id,
            %role,
            existing = outcome.existing_account,
            "registration complete"
        );
        tab.go(outcome.route);
        Ok(outcome)
    }

    /// Returns whether `role` was new to the account.
    async fn add_role(
        &self,
        tab: &Tab,
        user_id: &str,
        form: &RegistrationForm,
        city: &str,
        role: RoleTag,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let Some(profile) = tab.baas.fetch_profile(user_id).await? else {
            let row = NewProfile::new(
                user_id,
                role,
                form.email.trim(),
                form.name.trim(),
                form.phone.trim(),
                city,
                now,
            );
            tab.baas.insert_profile(&row).await?;
            return Ok(true);
        };

        let mut held = roles::normalize_profile(&profile);
        if !held.insert(role) {
            return Ok(false);
        }
        let patch = ProfilePatch::default().with_roles(held).touched(now);
        tab.baas.update_profile(user_id, &patch).await?;
        Ok(true)
    }

    async fn create_account(
        &self,
        tab: &Tab,
        form: &RegistrationForm,
        email: &str,
        city: &str,
        role: RoleTag,
    ) -> Result<String, AuthError> {
        let request = SignUpRequest {
            email: email.to_owned(),
            password: form.password.clone(),
            metadata: SignUpMetadata {
                name: form.name.trim().to_owned(),
                phone: form.phone.trim().to_owned(),
            },
            redirect_to: self.verification_redirect(role),
        };
        let signed_up = tab.baas.sign_up(&request).await?;
        let row = NewProfile::new(
            signed_up.user_id.clone(),
            role,
            email,
            form.name.trim(),
            form.phone.trim(),
            city,
            Utc::now(),
        );
        tab.baas.insert_profile(&row).await?;
        Ok(signed_up.user_id)
    }
}

fn welcome_text(role: RoleTag) -> String {
    let next = match role {
        RoleTag::Requester => "start posting jobs",
        RoleTag::Worker => "start finding work",
        RoleTag::Affiliate => "start earning referral rewards",
    };
    format!("Check your email to verify your account, then {next}.")
}

/// Pick a role on the chooser page and continue to its signup form.
pub fn choose_role(tab: &Tab, role: RoleTag) -> Route {
    tab.go(Route::Signup { role: Some(role) })
}

/// Role for the signup page. Missing or unknown roles send the viewer back to
/// the chooser.
pub fn signup_role(tab: &Tab, requested: Option<&str>) -> Option<RoleTag> {
    let role = requested.and_then(RoleTag::parse);
    if role.is_none() {
        tab.go(Route::ChooseRole);
    }
    role
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid() -> RegistrationForm {
        RegistrationForm {
            name: "Ana Diaz".into(),
            email: "ana@example.com".into(),
            phone: "713-555-0101".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            city: String::new(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn first_problem_is_reported() {
        let form = RegistrationForm {
            name: " ".into(),
            password: "abc".into(),
            ..valid()
        };
        assert_eq!(
            form.problems(),
            vec![
                "Please enter your full name.",
                "Password must be at least 6 characters.",
                "Passwords do not match.",
            ]
        );
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please enter your full name.");
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("ab.co"));
    }

    #[test]
    fn verification_redirect_carries_role() {
        let flow = RegisterFlow::new("https://thosejobs.example/", "Houston");
        assert_eq!(
            flow.verification_redirect(RoleTag::Worker),
            "https://thosejobs.example/email-verification-success?role=worker"
        );
    }
}
