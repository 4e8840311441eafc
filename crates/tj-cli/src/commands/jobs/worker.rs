use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_core::{Job, JobStatus, Notice, QuoteStatus};
use tj_jobs::{MyQuote, QuoteForm, WorkerDesk};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::JobsQuoteArgs;
use crate::output::output;

use super::failed;

#[derive(Serialize)]
struct MyQuoteRow {
    id: String,
    job_id: String,
    job: String,
    amount: f64,
    status: QuoteStatus,
    quoted: DateTime<Utc>,
}

impl From<MyQuote> for MyQuoteRow {
    fn from(row: MyQuote) -> Self {
        Self {
            id: row.quote.id,
            job: row.job_title.unwrap_or_else(|| "Job".into()),
            job_id: row.quote.job_id,
            amount: row.quote.quoted_amount,
            status: row.quote.status,
            quoted: row.quote.created_at,
        }
    }
}

#[derive(Serialize)]
struct AssignedRow {
    id: String,
    title: String,
    status: JobStatus,
    earnings: f64,
    area: Option<String>,
    deadline: Option<DateTime<Utc>>,
}

impl From<Job> for AssignedRow {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            status: job.status,
            earnings: job.worker_earnings,
            area: job.address_area,
            deadline: job.deadline,
        }
    }
}

#[derive(Serialize)]
struct ActionResponse<'a> {
    job_id: &'a str,
    notice: Notice,
}

pub async fn quote(args: &JobsQuoteArgs, desk: &WorkerDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let form = QuoteForm {
        amount: args.amount.clone(),
        message: args.message.clone(),
    };
    let notice = desk.submit_quote(&args.job_id, &form).await.map_err(failed)?;
    output(
        &ActionResponse {
            job_id: &args.job_id,
            notice,
        },
        flags.format,
    )
}

pub async fn my_quotes(desk: &WorkerDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows: Vec<MyQuoteRow> = desk
        .my_quotes()
        .await
        .map_err(failed)?
        .into_iter()
        .map(MyQuoteRow::from)
        .collect();
    output(&rows, flags.format)
}

pub async fn assigned(desk: &WorkerDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows: Vec<AssignedRow> = desk
        .assigned_jobs()
        .await
        .map_err(failed)?
        .into_iter()
        .map(AssignedRow::from)
        .collect();
    output(&rows, flags.format)
}

pub async fn start(job_id: &str, desk: &WorkerDesk, flags: &GlobalFlags) -> anyhow::Result<()> {
    let notice = desk.start_job(job_id).await.map_err(failed)?;
    output(&ActionResponse { job_id, notice }, flags.format)
}
