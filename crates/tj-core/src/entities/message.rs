use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A chat message attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessageRow {
    pub id: String,
    pub job_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}
