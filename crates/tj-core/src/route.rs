//! Typed navigation targets.
//!
//! ```text
//! /                                    Home
//! /choose-role                         ChooseRole
//! /browse-jobs                         BrowseJobs
//! /login[?role=<tag>]                  Login
//! /signup[?role=<tag>]                 Signup
//! /<tag>-dashboard                     Dashboard
//! /email-verification-success?role=    EmailVerificationSuccess
//! ```

use std::fmt;

use crate::enums::RoleTag;
use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Default landing view.
    Home,
    ChooseRole,
    /// Public list of open jobs.
    BrowseJobs,
    /// Login view, optionally pre-selecting a role's form.
    Login { role: Option<RoleTag> },
    Signup { role: Option<RoleTag> },
    /// Role-scoped dashboard, the landing view after login.
    Dashboard(RoleTag),
    EmailVerificationSuccess { role: RoleTag },
}

impl Route {
    /// Where a guard or a failed check sends a visitor lacking `role`.
    #[must_use]
    pub const fn login_for(role: RoleTag) -> Self {
        Self::Login { role: Some(role) }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::ChooseRole => "/choose-role".into(),
            Self::BrowseJobs => "/browse-jobs".into(),
            Self::Login { role: None } => "/login".into(),
            Self::Login { role: Some(role) } => format!("/login?role={role}"),
            Self::Signup { role: None } => "/signup".into(),
            Self::Signup { role: Some(role) } => format!("/signup?role={role}"),
            Self::Dashboard(role) => format!("/{role}-dashboard"),
            Self::EmailVerificationSuccess { role } => {
                format!("/email-verification-success?role={role}")
            }
        }
    }

    /// Parse a path with an optional `?role=` query.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownRoute` for paths outside the table above.
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let (base, query) = path.split_once('?').unwrap_or((path, ""));
        let role = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "role")
            .and_then(|(_, value)| RoleTag::parse(value));

        let route = match base {
            "/" | "" => Self::Home,
            "/choose-role" => Self::ChooseRole,
            "/browse-jobs" => Self::BrowseJobs,
            "/login" => Self::Login { role },
            "/signup" => Self::Signup { role },
            "/email-verification-success" => Self::EmailVerificationSuccess {
                role: role.unwrap_or(RoleTag::Requester),
            },
            other => other
                .strip_prefix('/')
                .and_then(|rest| rest.strip_suffix("-dashboard"))
                .and_then(RoleTag::parse)
                .map(Self::Dashboard)
                .ok_or_else(|| CoreError::UnknownRoute(path.to_string()))?,
        };
        Ok(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
