//! Request and response shapes of the backend contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tj_core::{JobStatus, MessageRow, QuoteStatus, RoleSet, RoleTag};

/// A `users` row exactly as stored.
///
/// `roles` is left as raw JSON: depending on when the row was written it is an
/// array, a JSON-encoded string, a bracketed legacy string, or absent. Only the
/// role normalizer interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub roles: serde_json::Value,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Row inserted for a freshly registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub roles: RoleSet,
    /// Legacy scalar; always `roles[0]`.
    pub role: RoleTag,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProfile {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        role: RoleTag,
        email: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        city: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            roles: RoleSet::single(role),
            role,
            email: email.into(),
            name: name.into(),
            phone: phone.into(),
            city: city.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a `users` row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    /// Patch replacing the role set; the legacy scalar follows `roles[0]`.
    #[must_use]
    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.role = roles.primary();
        self.roles = Some(roles);
        self
    }

    #[must_use]
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }
}

/// Row inserted when a requester posts a job. The backend assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub requester_id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_area: Option<String>,
    pub budget: f64,
    pub worker_earnings: f64,
    pub platform_fee: f64,
    pub status: JobStatus,
    pub accepting_quotes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update of a `jobs` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_worker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepting_quotes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row inserted for a worker's first quote on a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuote {
    pub job_id: String,
    pub worker_id: String,
    pub quoted_amount: f64,
    pub message: Option<String>,
    pub status: QuoteStatus,
}

/// Partial update of a `quotes` row.
///
/// `message: Some(None)` clears the stored message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QuoteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuotePatch {
    #[must_use]
    pub fn status(status: QuoteStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }
}

/// Profile metadata attached to a sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpMetadata {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub metadata: SignUpMetadata,
    /// Where the verification email link lands.
    pub redirect_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user_id: String,
    /// Present only when the service does not require email confirmation.
    pub session: Option<tj_core::Session>,
}

/// Row filter for the message change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFilter {
    pub to_user_id: String,
}

impl MessageFilter {
    #[must_use]
    pub fn to_user(user_id: impl Into<String>) -> Self {
        Self {
            to_user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, row: &MessageRow) -> bool {
        row.to_user_id == self.to_user_id
    }

    /// Filter expression in the row store's query syntax.
    #[must_use]
    pub fn expression(&self) -> String {
        format!("to_user_id=eq.{}", self.to_user_id)
    }
}

/// A change delivered by the message feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageEvent {
    Insert(MessageRow),
    Update(MessageRow),
}

impl MessageEvent {
    #[must_use]
    pub const fn row(&self) -> &MessageRow {
        match self {
            Self::Insert(row) | Self::Update(row) => row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_profile_keeps_unknown_columns() {
        let raw: RawProfile = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "roles": "['requester','worker']",
            "rating_average": 4.5
        }))
        .unwrap();
        assert_eq!(raw.roles, serde_json::json!("['requester','worker']"));
        assert!(raw.role.is_none());
        assert_eq!(raw.extra["rating_average"], serde_json::json!(4.5));
    }

    #[test]
    fn raw_profile_missing_roles_is_null() {
        let raw: RawProfile =
            serde_json::from_value(serde_json::json!({ "id": "u-1", "role": "worker" })).unwrap();
        assert!(raw.roles.is_null());
        assert_eq!(raw.role.as_deref(), Some("worker"));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let roles: RoleSet = [RoleTag::Worker, RoleTag::Requester].into_iter().collect();
        let patch = ProfilePatch::default().with_roles(roles);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "roles": ["worker", "requester"], "role": "worker" })
        );
    }

    #[test]
    fn quote_patch_can_clear_the_message() {
        let patch = QuotePatch {
            quoted_amount: Some(95.0),
            message: Some(None),
            ..QuotePatch::status(QuoteStatus::Pending)
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "quoted_amount": 95.0, "message": null, "status": "pending" })
        );
    }

    #[test]
    fn job_patch_serializes_only_set_fields() {
        let patch = JobPatch {
            status: Some(JobStatus::Cancelled),
            ..JobPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "status": "cancelled" })
        );
    }

    #[test]
    fn filter_expression() {
        let filter = MessageFilter::to_user("u-9");
        assert_eq!(filter.expression(), "to_user_id=eq.u-9");
    }
}
