use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use tj_core::JobStatus;
use tj_jobs::SortOrder;

#[derive(Clone, Debug, Subcommand)]
pub enum JobsCommands {
    /// Browse open jobs. No sign-in needed.
    Browse(JobsBrowseArgs),
    /// Post a job (requester).
    Post(JobsPostArgs),
    /// List the jobs you posted (requester).
    Mine(JobsMineArgs),
    /// Quotes on one of your jobs (requester).
    Quotes(JobIdArgs),
    /// Accept a quote and assign its job (requester).
    Accept(QuoteIdArgs),
    /// Reject a quote (requester).
    Reject(QuoteIdArgs),
    /// Cancel a job that has not started (requester).
    Cancel(JobIdArgs),
    /// Quote on an open job, or revise your quote (worker).
    Quote(JobsQuoteArgs),
    /// List your quotes (worker).
    MyQuotes,
    /// List jobs assigned to you (worker).
    Assigned,
    /// Start an assigned job (worker).
    Start(JobIdArgs),
}

#[derive(Clone, Debug, Args)]
pub struct JobsBrowseArgs {
    /// Match title, description, area or category.
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// newest, oldest, budget-high, budget-low
    #[arg(long, default_value = "newest", value_parser = parse_sort)]
    pub sort: SortOrder,
}

#[derive(Clone, Debug, Args)]
pub struct JobsPostArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub address: String,
    /// Area shown publicly; defaults to the address.
    #[arg(long, default_value = "")]
    pub area: String,
    /// Total budget in dollars.
    #[arg(long)]
    pub budget: String,
    /// RFC 3339 timestamp.
    #[arg(long)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Args)]
pub struct JobsMineArgs {
    #[arg(long, value_parser = parse_status)]
    pub status: Option<JobStatus>,
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct JobsQuoteArgs {
    pub job_id: String,
    /// Quoted price in dollars.
    #[arg(long)]
    pub amount: String,
    #[arg(long, default_value = "")]
    pub message: String,
}

#[derive(Clone, Debug, Args)]
pub struct JobIdArgs {
    pub job_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct QuoteIdArgs {
    pub quote_id: String,
}

pub fn parse_sort(value: &str) -> Result<SortOrder, String> {
    value.parse::<SortOrder>().map_err(|error| error.to_string())
}

pub fn parse_status(value: &str) -> Result<JobStatus, String> {
    value.parse::<JobStatus>().map_err(|error| error.to_string())
}
