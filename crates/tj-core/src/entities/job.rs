use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{JobStatus, QuoteStatus};

/// The slice of a job row the notification feed needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
}

/// A `jobs` row.
///
/// Amounts are dollars. `worker_earnings` and `platform_fee` are fixed when the
/// job is posted and never recomputed from `budget`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: String,
    pub requester_id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub address_area: Option<String>,
    pub budget: f64,
    #[serde(default)]
    pub worker_earnings: f64,
    #[serde(default)]
    pub platform_fee: f64,
    pub status: JobStatus,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Missing on rows written before quoting existed; those accept quotes.
    #[serde(default = "accepting_by_default")]
    pub accepting_quotes: bool,
    #[serde(default)]
    pub assigned_worker_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

const fn accepting_by_default() -> bool {
    true
}

impl Job {
    #[must_use]
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    /// Open for new or revised quotes.
    #[must_use]
    pub fn takes_quotes(&self) -> bool {
        self.status == JobStatus::Posted && self.accepting_quotes
    }

    /// Case-insensitive match against title, description, area, and category.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.title.as_str(),
            self.description.as_str(),
            self.address_area.as_deref().unwrap_or_default(),
            self.category.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A `quotes` row: one worker's price for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Quote {
    pub id: String,
    pub job_id: String,
    pub worker_id: String,
    pub quoted_amount: f64,
    #[serde(default)]
    pub message: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        serde_json::from_value(serde_json::json!({
            "id": "job-1",
            "requester_id": "u-1",
            "title": "Yard cleanup",
            "category": "Outdoor",
            "description": "Rake leaves",
            "address_area": "Montrose",
            "budget": 80.0,
            "status": "posted",
            "created_at": "2026-03-01T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn old_rows_accept_quotes() {
        let job = job();
        assert!(job.accepting_quotes);
        assert!(job.takes_quotes());
        assert!(job.assigned_worker_id.is_none());
    }

    #[test]
    fn closed_or_assigned_jobs_take_no_quotes() {
        let mut job = job();
        job.accepting_quotes = false;
        assert!(!job.takes_quotes());
        job.accepting_quotes = true;
        job.status = JobStatus::Accepted;
        assert!(!job.takes_quotes());
    }

    #[test]
    fn search_covers_area_and_category() {
        let job = job();
        assert!(job.matches("montrose"));
        assert!(job.matches("OUTDOOR"));
        assert!(job.matches("  "));
        assert!(!job.matches("plumbing"));
    }
}
