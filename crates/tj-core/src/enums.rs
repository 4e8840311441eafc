//! Role tags, the account context, and job/quote lifecycle states.
//!
//! All serialize as `snake_case` tags. `AccountContext` additionally accepts
//! the legacy account-type names (`user`, `provider`) when read back from
//! persisted state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// RoleTag
// ---------------------------------------------------------------------------

/// A capability an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    /// Posts jobs and accepts quotes.
    Requester,
    /// Browses jobs and sends quotes.
    Worker,
    /// Refers users for commission.
    Affiliate,
}

impl RoleTag {
    pub const ALL: [Self; 3] = [Self::Requester, Self::Worker, Self::Affiliate];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requester => "requester",
            Self::Worker => "worker",
            Self::Affiliate => "affiliate",
        }
    }

    /// Human label used in notices and menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Requester => "Requester",
            Self::Worker => "Worker",
            Self::Affiliate => "Affiliate",
        }
    }

    /// Lenient parse: surrounding whitespace and ASCII case are ignored.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AccountContext
// ---------------------------------------------------------------------------

/// The held role a session is currently acting as.
///
/// Constructed only by the context selector, which guarantees the wrapped role
/// is a member of the identity's role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AccountContext(RoleTag);

impl AccountContext {
    #[must_use]
    pub const fn new(role: RoleTag) -> Self {
        Self(role)
    }

    #[must_use]
    pub const fn role(self) -> RoleTag {
        self.0
    }

    /// Decode a persisted context value.
    ///
    /// Accepts canonical role tags and the legacy account-type names
    /// (`user` → requester, `provider` → worker).
    #[must_use]
    pub fn from_persisted(value: &str) -> Option<Self> {
        match value.trim() {
            "user" => Some(Self(RoleTag::Requester)),
            "provider" => Some(Self(RoleTag::Worker)),
            other => RoleTag::parse(other).map(Self),
        }
    }

    /// Value written to persisted state.
    #[must_use]
    pub const fn as_persisted(self) -> &'static str {
        self.0.as_str()
    }

    #[must_use]
    pub const fn mode_name(self) -> &'static str {
        match self.0 {
            RoleTag::Requester => "requester-mode",
            RoleTag::Worker => "worker-mode",
            RoleTag::Affiliate => "affiliate-mode",
        }
    }
}

impl From<RoleTag> for AccountContext {
    fn from(role: RoleTag) -> Self {
        Self(role)
    }
}

impl fmt::Display for AccountContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode_name())
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a posted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Posted,
    Accepted,
    InProgress,
    Submitted,
    Approved,
    Disputed,
    Cancelled,
    Completed,
}

impl JobStatus {
    pub const ALL: [Self; 8] = [
        Self::Posted,
        Self::Accepted,
        Self::InProgress,
        Self::Submitted,
        Self::Approved,
        Self::Disputed,
        Self::Cancelled,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Disputed => "disputed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Whether a job may move from `self` to `next`.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Posted, Self::Accepted | Self::Cancelled)
                | (Self::Accepted, Self::InProgress | Self::Cancelled)
                | (Self::InProgress, Self::Submitted | Self::Disputed)
                | (Self::Submitted, Self::Approved | Self::Disputed)
                | (Self::Approved, Self::Completed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| CoreError::Validation(format!("unknown job status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// QuoteStatus
// ---------------------------------------------------------------------------

/// State of a worker's price offer on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl QuoteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
