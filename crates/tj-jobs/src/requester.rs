//! The requester's side of the board: post jobs, review quotes, assign.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_auth::Authorized;
use tj_baas::{Baas, JobPatch, NewJob, QuotePatch};
use tj_core::{Job, JobStatus, Notice, Quote, QuoteStatus, RoleTag};

use crate::money::{self, AmountKind};
use crate::{JobsError, require_role};

/// The post-a-job form as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobForm {
    pub title: String,
    pub category: String,
    pub description: String,
    pub address: String,
    /// Shown on the public board; falls back to `address` when blank.
    pub address_area: String,
    pub budget: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl JobForm {
    fn to_new_job(&self, requester_id: &str) -> Result<NewJob, JobsError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(JobsError::Validation("Please enter a job title.".into()));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(JobsError::Validation("Please choose a category.".into()));
        }
        let budget = money::parse_amount(&self.budget, AmountKind::Budget)?;
        let split = money::split(budget);
        let address = non_blank(&self.address);
        let address_area = non_blank(&self.address_area).or_else(|| address.clone());

        Ok(NewJob {
            requester_id: requester_id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            description: self.description.trim().to_string(),
            address,
            address_area,
            budget,
            worker_earnings: split.worker_earnings,
            platform_fee: split.platform_fee,
            status: JobStatus::Posted,
            accepting_quotes: true,
            deadline: self.deadline,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Narrow the requester's own job list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

/// A quote with the quoting worker's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: Quote,
    pub worker_name: Option<String>,
}

pub struct RequesterDesk {
    baas: Arc<dyn Baas>,
    requester_id: String,
}

impl RequesterDesk {
    /// Open the desk for a viewer the requester guard admitted.
    ///
    /// # Errors
    ///
    /// `JobsError::RoleRequired` if the identity does not hold the requester role.
    pub fn open(baas: Arc<dyn Baas>, authorized: &Authorized) -> Result<Self, JobsError> {
        require_role(authorized, RoleTag::Requester)?;
        Ok(Self {
            baas,
            requester_id: authorized.identity.id.clone(),
        })
    }

    #[must_use]
    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }

    /// Validate the form and insert an open job taking quotes.
    ///
    /// # Errors
    ///
    /// `JobsError::Validation` for a bad form, `JobsError::Backend` if the insert fails.
    pub async fn post_job(&self, form: &JobForm) -> Result<(Job, Notice), JobsError> {
        let new_job = form.to_new_job(&self.requester_id)?;
        let job = self.baas.insert_job(&new_job).await?;
        tracing::info!(job_id = %job.id, budget = job.budget, "job posted");
        Ok((
            job,
            Notice::success(
                "Job Posted!",
                "Your job has been posted successfully. Workers can now see and accept it.",
            ),
        ))
    }

    /// The requester's jobs, newest first.
    ///
    /// # Errors
    ///
    /// `JobsError::Backend` if the jobs cannot be read.
    pub async fn my_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, JobsError> {
        let jobs = self.baas.jobs_posted_by(&self.requester_id).await?;
        Ok(jobs
            .into_iter()
            .filter(|job| filter.status.is_none_or(|status| job.status == status))
            .filter(|job| filter.search.as_deref().is_none_or(|needle| job.matches(needle)))
            .collect())
    }

    /// Quotes on one of the requester's jobs, newest first.
    ///
    /// # Errors
    ///
    /// `JobNotFound`/`NotOwner` for a job that is not the requester's.
    pub async fn quotes(&self, job_id: &str) -> Result<Vec<QuoteView>, JobsError> {
        self.owned_job(job_id).await?;
        let quotes = self.baas.quotes_for_job(job_id).await?;
        let mut views = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let worker_name = self.name_of(&quote.worker_id).await;
            views.push(QuoteView { quote, worker_name });
        }
        Ok(views)
    }

    /// Accept a pending quote: the job is assigned to its worker and stops
    /// taking quotes, and every other pending quote on it is rejected.
    ///
    /// The job is written first. If a later write fails, accepting the same
    /// quote again resumes from the assigned job.
    ///
    /// # Errors
    ///
    /// `QuoteNotPending` for a decided quote, `InvalidTransition` if the job
    /// is no longer open, `JobsError::Backend` if an update fails.
    pub async fn accept_quote(&self, quote_id: &str) -> Result<Notice, JobsError> {
        let (quote, job) = self.pending_quote(quote_id).await?;
        let resuming = job.status == JobStatus::Accepted
            && job.assigned_worker_id.as_deref() == Some(quote.worker_id.as_str());
        if !resuming && !job.status.can_become(JobStatus::Accepted) {
            return Err(JobsError::InvalidTransition {
                from: job.status,
                to: JobStatus::Accepted,
            });
        }

        let now = Utc::now();
        if !resuming {
            let assign = JobPatch {
                status: Some(JobStatus::Accepted),
                assigned_worker_id: Some(quote.worker_id.clone()),
                accepting_quotes: Some(false),
                updated_at: Some(now),
            };
            self.baas.update_job(&job.id, &assign).await?;
        }
        self.baas
            .update_quote(&quote.id, &QuotePatch::status(QuoteStatus::Accepted).touched(now))
            .await?;

        let rivals = self.baas.quotes_for_job(&job.id).await?;
        for rival in rivals
            .iter()
            .filter(|rival| rival.id != quote.id && rival.status == QuoteStatus::Pending)
        {
            self.baas
                .update_quote(&rival.id, &QuotePatch::status(QuoteStatus::Rejected).touched(now))
                .await?;
        }
        tracing::info!(job_id = %job.id, quote_id = %quote.id, worker_id = %quote.worker_id, resuming, "quote accepted");

        let worker = self
            .name_of(&quote.worker_id)
            .await
            .unwrap_or_else(|| "the worker".into());
        Ok(Notice::success(
            "Quote Accepted!",
            format!("You've accepted {worker}'s quote. The job has been assigned."),
        ))
    }

    /// Reject a pending quote. The job stays open.
    ///
    /// # Errors
    ///
    /// `QuoteNotPending` for a decided quote, `JobsError::Backend` if the update fails.
    pub async fn reject_quote(&self, quote_id: &str) -> Result<Notice, JobsError> {
        let (quote, _) = self.pending_quote(quote_id).await?;
        self.baas
            .update_quote(
                &quote.id,
                &QuotePatch::status(QuoteStatus::Rejected).touched(Utc::now()),
            )
            .await?;
        tracing::info!(quote_id = %quote.id, "quote rejected");
        Ok(Notice::success("Quote Rejected", "The quote has been rejected."))
    }

    /// Cancel a job that has not started.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once work is under way, `NotOwner` for another
    /// requester's job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<Notice, JobsError> {
        let job = self.owned_job(job_id).await?;
        if !job.status.can_become(JobStatus::Cancelled) {
            return Err(JobsError::InvalidTransition {
                from: job.status,
                to: JobStatus::Cancelled,
            });
        }
        let patch = JobPatch {
            status: Some(JobStatus::Cancelled),
            accepting_quotes: Some(false),
            updated_at: Some(Utc::now()),
            ..JobPatch::default()
        };
        self.baas.update_job(job_id, &patch).await?;
        tracing::info!(job_id, "job cancelled");
        Ok(Notice::success("Job Cancelled", "The job has been cancelled successfully."))
    }

    async fn owned_job(&self, job_id: &str) -> Result<Job, JobsError> {
        let job = self
            .baas
            .job(job_id)
            .await?
            .ok_or_else(|| JobsError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        if job.requester_id != self.requester_id {
            return Err(JobsError::NotOwner {
                job_id: job_id.to_string(),
            });
        }
        Ok(job)
    }

    async fn pending_quote(&self, quote_id: &str) -> Result<(Quote, Job), JobsError> {
        let quote = self
            .baas
            .quote(quote_id)
            .await?
            .ok_or_else(|| JobsError::QuoteNotFound {
                quote_id: quote_id.to_string(),
            })?;
        let job = self.owned_job(&quote.job_id).await?;
        if quote.status != QuoteStatus::Pending {
            return Err(JobsError::QuoteNotPending {
                status: quote.status,
            });
        }
        Ok((quote, job))
    }

    async fn name_of(&self, user_id: &str) -> Option<String> {
        self.baas.user_name(user_id).await.unwrap_or_else(|error| {
            tracing::warn!(%error, user_id, "name lookup failed");
            None
        })
    }
}
