//! # tj-core
//!
//! Domain types shared by every ThoseJobs client crate.
//!
//! - Role tags, the ordered role set, and the account context
//! - Identity, session, and persisted snapshot records
//! - Job, quote, and message rows read from the row store, with their
//!   lifecycle states
//! - Typed navigation routes
//! - User-facing notices
//! - Cross-cutting error types
//!
//! No crate outside `tj-auth::roles` ever sees the raw role encodings stored
//! by the backend; everything here is already normalized.

pub mod entities;
pub mod enums;
pub mod errors;
pub mod notice;
pub mod role_set;
pub mod route;

pub use entities::{
    Identity, IdentitySnapshot, Job, JobSummary, MessageRow, Quote, Session, TokenStamp,
};
pub use enums::{AccountContext, JobStatus, QuoteStatus, RoleTag};
pub use errors::CoreError;
pub use notice::{Notice, NoticeVariant};
pub use role_set::RoleSet;
pub use route::Route;
