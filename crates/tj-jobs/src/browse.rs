//! The public job board: open jobs with who posted them and how much
//! competition each already has.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tj_baas::Baas;
use tj_core::{Job, QuoteStatus};

use crate::JobsError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    BudgetHigh,
    BudgetLow,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::BudgetHigh, Self::BudgetLow];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::BudgetHigh => "budget-high",
            Self::BudgetLow => "budget-low",
        }
    }

    fn compare(self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            Self::Newest => b.job.created_at.cmp(&a.job.created_at),
            Self::Oldest => a.job.created_at.cmp(&b.job.created_at),
            Self::BudgetHigh => b.job.budget.total_cmp(&a.job.budget),
            Self::BudgetLow => a.job.budget.total_cmp(&b.job.budget),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = JobsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == value)
            .ok_or_else(|| {
                JobsError::Validation(format!(
                    "unknown sort order {value:?}; expected newest, oldest, budget-high or budget-low"
                ))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    /// Matched against title, description, area and category.
    pub search: Option<String>,
    /// Exact category; `None` shows all.
    pub category: Option<String>,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub job: Job,
    pub requester_name: Option<String>,
    /// Quotes still awaiting the requester's decision.
    pub pending_quotes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    /// Open jobs before filtering.
    pub total: usize,
    pub listings: Vec<Listing>,
}

/// Load the board. Anyone may browse; quoting needs a worker account.
///
/// A failed requester or quote lookup degrades that listing to no name and
/// zero quotes instead of failing the page.
///
/// # Errors
///
/// `JobsError::Backend` if the open jobs cannot be read.
pub async fn browse(baas: &dyn Baas, query: &BrowseQuery) -> Result<Board, JobsError> {
    let jobs = baas.open_jobs().await?;
    let total = jobs.len();

    let mut listings = Vec::new();
    for job in jobs.into_iter().filter(|job| query.admits(job)) {
        listings.push(enrich(baas, job).await);
    }
    listings.sort_by(|a, b| query.sort.compare(a, b));

    tracing::debug!(total, shown = listings.len(), sort = %query.sort, "job board loaded");
    Ok(Board { total, listings })
}

impl BrowseQuery {
    fn admits(&self, job: &Job) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| job.category == category);
        category_ok && self.search.as_deref().is_none_or(|needle| job.matches(needle))
    }
}

async fn enrich(baas: &dyn Baas, job: Job) -> Listing {
    let requester_name = baas.user_name(&job.requester_id).await.unwrap_or_else(|error| {
        tracing::warn!(%error, job_id = %job.id, "requester lookup failed");
        None
    });
    let pending_quotes = match baas.quotes_for_job(&job.id).await {
        Ok(quotes) => quotes
            .iter()
            .filter(|quote| quote.status == QuoteStatus::Pending)
            .count(),
        Err(error) => {
            tracing::warn!(%error, job_id = %job.id, "quote count failed");
            0
        }
    };
    Listing {
        job,
        requester_name,
        pending_quotes,
    }
}
