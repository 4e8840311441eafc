use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_core::{Job, JobStatus, Notice, QuoteStatus};
use tj_jobs::{JobFilter, JobForm, QuoteView, RequesterDesk};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{JobsMineArgs, JobsPostArgs};
use crate::output::output;

use super::failed;

#[derive(Serialize)]
struct JobRow {
    id: String,
    title: String,
    status: JobStatus,
    budget: f64,
    worker_earnings: f64,
    accepting_quotes: bool,
    assigned_worker_id: Option<String>,
    posted: DateTime<Utc>,
}

impl From<Job> for JobRow {
    fn from(job: Job) -> Self {
        Self {
            accepting_quotes: job.takes_quotes(),
            id: job.id,
            title: job.title,
            status: job.status,
            budget: job.budget,
            worker_earnings: job.worker_earnings,
            assigned_worker_id: job.assigned_worker_id,
            posted: job.created_at,
        }
    }
}

#[derive(Serialize)]
struct QuoteRow {
    id: String,
    worker: String,
    amount: f64,
    message: Option<String>,
    status: QuoteStatus,
    quoted: DateTime<Utc>,
}

impl From<QuoteView> for QuoteRow {
    fn from(view: QuoteView) -> Self {
        Self {
            id: view.quote.id,
            worker: view.worker_name.unwrap_or_else(|| "Unknown".into()),
            amount: view.quote.quoted_amount,
            message: view.quote.message,
            status: view.quote.status,
            quoted: view.quote.created_at,
        }
    }
}

#[derive(Serialize)]
struct PostResponse {
    job: JobRow,
    notice: Notice,
}

#[derive(Serialize)]
struct ActionResponse<'a> {
    id: &'a str,
    notice: Notice,
}

pub async fn post(args: &JobsPostArgs, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let form = JobForm {
        title: args.title.clone(),
        category: args.category.clone(),
        description: args.description.clone(),
        address: args.address.clone(),
        address_area: args.area.clone(),
        budget: args.budget.clone(),
        deadline: args.deadline,
    };
    let (job, notice) = desk.post_job(&form).await.map_err(failed)?;
    output(
        &PostResponse {
            job: job.into(),
            notice,
        },
        flags.format,
    )
}

pub async fn mine(args: &JobsMineArgs, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = JobFilter {
        status: args.status,
        search: args.search.clone(),
    };
    let rows: Vec<JobRow> = desk
        .my_jobs(&filter)
        .await
        .map_err(failed)?
        .into_iter()
        .map(JobRow::from)
        .collect();
    output(&rows, flags.format)
}

pub async fn quotes(job_id: &str, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows: Vec<QuoteRow> = desk
        .quotes(job_id)
        .await
        .map_err(failed)?
        .into_iter()
        .map(QuoteRow::from)
        .collect();
    output(&rows, flags.format)
}

pub async fn accept(quote_id: &str, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let notice = desk.accept_quote(quote_id).await.map_err(failed)?;
    output(&ActionResponse { id: quote_id, notice }, flags.format)
}

pub async fn reject(quote_id: &str, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let notice = desk.reject_quote(quote_id).await.map_err(failed)?;
    output(&ActionResponse { id: quote_id, notice }, flags.format)
}

pub async fn cancel(job_id: &str, desk: &RequesterDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let notice = desk.cancel_job(job_id).await.map_err(failed)?;
    output(&ActionResponse { id: job_id, notice }, flags.format)
}
