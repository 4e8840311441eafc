//! The worker's side of the board: quote on open jobs, then start the ones won.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tj_auth::Authorized;
use tj_baas::{Baas, JobPatch, NewQuote, QuotePatch};
use tj_core::{Job, JobStatus, Notice, Quote, QuoteStatus, RoleTag};

use crate::money::{self, AmountKind};
use crate::{JobsError, require_role};

/// The quote dialog as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteForm {
    pub amount: String,
    pub message: String,
}

/// One of the worker's quotes with the job it prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MyQuote {
    #[serde(flatten)]
    pub quote: Quote,
    pub job_title: Option<String>,
}

pub struct WorkerDesk {
    baas: Arc<dyn Baas>,
    worker_id: String,
}

impl WorkerDesk {
    /// Open the desk for a viewer the worker guard admitted.
    ///
    /// # Errors
    ///
    /// `JobsError::RoleRequired` if the identity does not hold the worker role.
    pub fn open(baas: Arc<dyn Baas>, authorized: &Authorized) -> Result<Self, JobsError> {
        require_role(authorized, RoleTag::Worker)?;
        Ok(Self {
            baas,
            worker_id: authorized.identity.id.clone(),
        })
    }

    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Quote on an open job. A second quote on the same job revises the
    /// first and puts it back to pending.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad amount, `QuotesClosed` once the job stopped
    /// taking quotes, `JobsError::Backend` if the write fails.
    pub async fn submit_quote(&self, job_id: &str, form: &QuoteForm) -> Result<Notice, JobsError> {
        let amount = money::parse_amount(&form.amount, AmountKind::Quote)?;
        let message = non_blank(&form.message);

        let job = self.job(job_id).await?;
        if !job.takes_quotes() {
            return Err(JobsError::QuotesClosed {
                job_id: job_id.to_string(),
            });
        }

        let existing = self
            .baas
            .quotes_for_job(job_id)
            .await?
            .into_iter()
            .find(|quote| quote.worker_id == self.worker_id);

        if let Some(existing) = existing {
            let patch = QuotePatch {
                quoted_amount: Some(amount),
                message: Some(message),
                status: Some(QuoteStatus::Pending),
                updated_at: Some(Utc::now()),
            };
            self.baas.update_quote(&existing.id, &patch).await?;
            tracing::info!(job_id, quote_id = %existing.id, amount, "quote revised");
            return Ok(Notice::success(
                "Quote Updated",
                "Your quote has been updated successfully.",
            ));
        }

        let quote = self
            .baas
            .insert_quote(&NewQuote {
                job_id: job_id.to_string(),
                worker_id: self.worker_id.clone(),
                quoted_amount: amount,
                message,
                status: QuoteStatus::Pending,
            })
            .await?;
        tracing::info!(job_id, quote_id = %quote.id, amount, "quote submitted");
        Ok(Notice::success(
            "Quote Submitted",
            "Your quote has been submitted successfully. The requester will review it.",
        ))
    }

    /// Every quote the worker has made, newest first.
    ///
    /// # Errors
    ///
    /// `JobsError::Backend` if the quotes cannot be read. Title lookups that
    /// fail leave `job_title` empty.
    pub async fn my_quotes(&self) -> Result<Vec<MyQuote>, JobsError> {
        let quotes = self.baas.quotes_by_worker(&self.worker_id).await?;
        let mut rows = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let job_title = self.baas.job_title(&quote.job_id).await.unwrap_or_else(|error| {
                tracing::warn!(%error, job_id = %quote.job_id, "job title lookup failed");
                None
            });
            rows.push(MyQuote { quote, job_title });
        }
        Ok(rows)
    }

    /// Jobs assigned to the worker, newest first.
    ///
    /// # Errors
    ///
    /// `JobsError::Backend` if the jobs cannot be read.
    pub async fn assigned_jobs(&self) -> Result<Vec<Job>, JobsError> {
        Ok(self.baas.jobs_assigned_to(&self.worker_id).await?)
    }

    /// Mark an assigned job as under way.
    ///
    /// # Errors
    ///
    /// `NotAssigned` for someone else's job, `InvalidTransition` unless the
    /// job is accepted.
    pub async fn start_job(&self, job_id: &str) -> Result<Notice, JobsError> {
        let job = self.job(job_id).await?;
        if job.assigned_worker_id.as_deref() != Some(self.worker_id.as_str()) {
            return Err(JobsError::NotAssigned {
                job_id: job_id.to_string(),
            });
        }
        if !job.status.can_become(JobStatus::InProgress) {
            return Err(JobsError::InvalidTransition {
                from: job.status,
                to: JobStatus::InProgress,
            });
        }
        let patch = JobPatch {
            status: Some(JobStatus::InProgress),
            updated_at: Some(Utc::now()),
            ..JobPatch::default()
        };
        self.baas.update_job(job_id, &patch).await?;
        tracing::info!(job_id, "job started");
        Ok(Notice::success("Job Started", "You have started working on this job."))
    }

    async fn job(&self, job_id: &str) -> Result<Job, JobsError> {
        self.baas
            .job(job_id)
            .await?
            .ok_or_else(|| JobsError::JobNotFound {
                job_id: job_id.to_string(),
            })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
