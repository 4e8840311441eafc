use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_jobs::{BrowseQuery, Listing};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::JobsBrowseArgs;
use crate::context::AppContext;
use crate::output::output;

use super::failed;

#[derive(Serialize)]
struct ListingRow {
    id: String,
    title: String,
    category: String,
    area: Option<String>,
    budget: f64,
    requester: Option<String>,
    quotes: usize,
    accepting_quotes: bool,
    posted: DateTime<Utc>,
}

impl From<Listing> for ListingRow {
    fn from(listing: Listing) -> Self {
        let accepting_quotes = listing.job.takes_quotes();
        Self {
            id: listing.job.id,
            title: listing.job.title,
            category: listing.job.category,
            area: listing.job.address_area,
            budget: listing.job.budget,
            requester: listing.requester_name,
            quotes: listing.pending_quotes,
            accepting_quotes,
            posted: listing.job.created_at,
        }
    }
}

pub async fn handle(args: &JobsBrowseArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let query = BrowseQuery {
        search: args.search.clone(),
        category: args.category.clone(),
        sort: args.sort,
    };
    let board = tj_jobs::browse(ctx.tab.baas.as_ref(), &query)
        .await
        .map_err(failed)?;
    if !flags.quiet {
        eprintln!("Showing {} of {} available jobs", board.listings.len(), board.total);
    }
    let rows: Vec<ListingRow> = board.listings.into_iter().map(ListingRow::from).collect();
    output(&rows, flags.format)
}
