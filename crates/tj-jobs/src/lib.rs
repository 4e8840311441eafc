//! # tj-jobs
//!
//! Posting, browsing and quoting. Anyone may [`browse`] the board of open
//! jobs. Requesters post and assign through a [`RequesterDesk`]; workers quote
//! and start work through a [`WorkerDesk`]. Each desk opens only from the
//! [`Authorized`] state of the matching role guard.
//!
//! Accepting a quote assigns the job, closes it to further quotes and rejects
//! the other pending quotes on it.

pub mod browse;
pub mod error;
pub mod money;
pub mod requester;
pub mod worker;

pub use browse::{Board, BrowseQuery, Listing, SortOrder, browse};
pub use error::JobsError;
pub use requester::{JobFilter, JobForm, QuoteView, RequesterDesk};
pub use worker::{MyQuote, QuoteForm, WorkerDesk};

use tj_auth::Authorized;
use tj_core::RoleTag;

fn require_role(authorized: &Authorized, role: RoleTag) -> Result<(), JobsError> {
    if authorized.identity.roles.contains(role) {
        Ok(())
    } else {
        Err(JobsError::RoleRequired { role })
    }
}
