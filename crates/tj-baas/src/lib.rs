//! # tj-baas
//!
//! The backend-as-a-service contract consumed by the ThoseJobs client:
//! password auth and token exchange, `users` profile rows, job, quote, and
//! message rows, and a change feed for new messages.
//!
//! Two implementations ship with the crate:
//! - [`HttpBaas`]: REST client for a Supabase-style project (GoTrue auth +
//!   PostgREST rows), persisting its own session in a token file and polling
//!   the `messages` table for the change feed.
//! - `MemoryBaas`: in-process backend for tests, compiled only with the
//!   `test-support` feature.

pub mod error;
pub mod http;
pub mod jwt;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod subscription;
pub mod token_store;
pub mod types;

pub use error::BaasError;
pub use http::HttpBaas;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryBaas;
pub use subscription::MessageSubscription;
pub use types::{
    JobPatch, MessageEvent, MessageFilter, NewJob, NewProfile, NewQuote, ProfilePatch, QuotePatch,
    RawProfile, SignUpMetadata, SignUpOutcome, SignUpRequest,
};

use async_trait::async_trait;
use tj_core::{Job, JobSummary, MessageRow, Quote, Session};

/// Everything the client needs from the backend.
///
/// Implementations must be cheap to share (`Arc<dyn Baas>`); every call is an
/// independent, idempotent request unless documented otherwise.
#[async_trait]
pub trait Baas: Send + Sync {
    // --- auth service ---

    /// Current session, if any. Refreshes an expired access token when possible.
    async fn get_session(&self) -> Result<Option<Session>, BaasError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, BaasError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BaasError>;

    async fn sign_out(&self) -> Result<(), BaasError>;

    /// Adopt tokens received out of band (email-verification deep link).
    async fn set_session(&self, access_token: &str, refresh_token: &str)
    -> Result<Session, BaasError>;

    // --- profile rows ---

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawProfile>, BaasError>;

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BaasError>;

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), BaasError>;

    // --- jobs and quotes ---

    /// Jobs still open for quotes (`status = posted`), newest first.
    async fn open_jobs(&self) -> Result<Vec<Job>, BaasError>;

    /// Jobs posted by `requester_id`, newest first.
    async fn jobs_posted_by(&self, requester_id: &str) -> Result<Vec<Job>, BaasError>;

    /// Jobs assigned to `worker_id`, newest first.
    async fn jobs_assigned_to(&self, worker_id: &str) -> Result<Vec<Job>, BaasError>;

    async fn job(&self, job_id: &str) -> Result<Option<Job>, BaasError>;

    /// Insert a job and return the stored row.
    async fn insert_job(&self, job: &NewJob) -> Result<Job, BaasError>;

    async fn update_job(&self, job_id: &str, patch: &JobPatch) -> Result<(), BaasError>;

    /// Quotes on `job_id`, newest first.
    async fn quotes_for_job(&self, job_id: &str) -> Result<Vec<Quote>, BaasError>;

    /// Quotes sent by `worker_id`, newest first.
    async fn quotes_by_worker(&self, worker_id: &str) -> Result<Vec<Quote>, BaasError>;

    async fn quote(&self, quote_id: &str) -> Result<Option<Quote>, BaasError>;

    /// Insert a quote and return the stored row. One quote per worker and job.
    async fn insert_quote(&self, quote: &NewQuote) -> Result<Quote, BaasError>;

    async fn update_quote(&self, quote_id: &str, patch: &QuotePatch) -> Result<(), BaasError>;

    // --- messages ---

    /// Jobs where the user is the requester or the assigned worker.
    async fn jobs_for_user(&self, user_id: &str) -> Result<Vec<JobSummary>, BaasError>;

    /// Unread messages on `job_ids` not sent by `exclude_sender`, newest first.
    async fn unread_messages(
        &self,
        job_ids: &[String],
        exclude_sender: &str,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BaasError>;

    /// Mark every unread message on `job_id` addressed to `reader_id` as read.
    async fn mark_messages_read(&self, job_id: &str, reader_id: &str) -> Result<(), BaasError>;

    async fn user_name(&self, user_id: &str) -> Result<Option<String>, BaasError>;

    async fn job_title(&self, job_id: &str) -> Result<Option<String>, BaasError>;

    // --- change feed ---

    /// Subscribe to message inserts and updates matching `filter`.
    ///
    /// The subscription ends when the returned handle is dropped.
    fn subscribe_messages(&self, filter: MessageFilter) -> MessageSubscription;
}
