//! In-process backend.
//!
//! Behaves like the hosted service closely enough for the client flows:
//! password accounts with email confirmation, a single current session,
//! schemaless `users` rows (so legacy role encodings can be seeded verbatim),
//! jobs, quotes, messages, and a push-style change feed. `set_unavailable(true)`
//! makes every call fail as a transport error; `fail_op` does so for one
//! operation. `gate` holds calls to one operation until released, so a test
//! can act while a request is in flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tj_core::{Job, JobStatus, JobSummary, MessageRow, Quote, Session};
use tokio::sync::{Notify, mpsc};

use crate::error::BaasError;
use crate::jwt;
use crate::subscription::MessageSubscription;
use crate::types::{
    JobPatch, MessageEvent, MessageFilter, NewJob, NewProfile, NewQuote, ProfilePatch, QuotePatch,
    RawProfile, SignUpOutcome, SignUpRequest,
};
use crate::Baas;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    current: Option<Session>,
    profiles: HashMap<String, serde_json::Value>,
    jobs: Vec<Job>,
    quotes: Vec<Quote>,
    messages: Vec<MessageRow>,
    feeds: Vec<(MessageFilter, mpsc::Sender<MessageEvent>)>,
    unavailable: bool,
    failing: HashSet<&'static str>,
    gates: HashMap<&'static str, Arc<Notify>>,
    waiting: HashMap<&'static str, usize>,
    next_id: u64,
    calls: HashMap<&'static str, usize>,
}

impl State {
    fn next_user_id(&mut self) -> String {
        self.next_row_id("user")
    }

    fn next_row_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    fn job_mut(&mut self, job_id: &str) -> Result<&mut Job, BaasError> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| not_found("jobs", job_id))
    }

    fn quote_mut(&mut self, quote_id: &str) -> Result<&mut Quote, BaasError> {
        self.quotes
            .iter_mut()
            .find(|quote| quote.id == quote_id)
            .ok_or_else(|| not_found("quotes", quote_id))
    }

    fn publish(&mut self, event: &MessageEvent) {
        self.feeds.retain(|(filter, tx)| {
            if !filter.matches(event.row()) {
                return !tx.is_closed();
            }
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(filter = %filter.expression(), "message feed full; dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

fn not_found(table: &str, id: &str) -> BaasError {
    BaasError::Rejected {
        status: 404,
        message: format!("{table} row {id} not found"),
    }
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

#[derive(Debug)]
pub struct MemoryBaas {
    state: Mutex<State>,
    token_ttl: TimeDelta,
}

impl Default for MemoryBaas {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBaas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            token_ttl: TimeDelta::hours(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pass_gate(&self, op: &'static str) {
        let gate = {
            let mut state = self.lock();
            let gate = state.gates.get(op).cloned();
            if gate.is_some() {
                *state.waiting.entry(op).or_default() += 1;
            }
            gate
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    /// Count the call and fail it if the backend is marked unavailable.
    async fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, State>, BaasError> {
        self.pass_gate(op).await;
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if state.unavailable || state.failing.contains(op) {
            return Err(BaasError::Unavailable(format!("{op}: connection refused")));
        }
        Ok(state)
    }

    fn issue(&self, user_id: &str, email: Option<String>) -> Session {
        let expires_at = Utc::now() + self.token_ttl;
        Session {
            user_id: user_id.to_string(),
            email,
            access_token: jwt::encode_unsigned(user_id, expires_at),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: Some(expires_at),
        }
    }

    // --- seeding and inspection ---

    /// Register a confirmed password account and return its user id.
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let mut state = self.lock();
        let user_id = state.next_user_id();
        state.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        user_id
    }

    /// Mark a signed-up account's email as verified.
    pub fn confirm_email(&self, email: &str) {
        if let Some(account) = self.lock().accounts.get_mut(email) {
            account.confirmed = true;
        }
    }

    /// Store a `users` row verbatim. The value must carry an `id` string.
    pub fn put_profile(&self, row: serde_json::Value) {
        if let Some(id) = row.get("id").and_then(serde_json::Value::as_str) {
            let id = id.to_string();
            self.lock().profiles.insert(id, row);
        }
    }

    #[must_use]
    pub fn profile(&self, user_id: &str) -> Option<serde_json::Value> {
        self.lock().profiles.get(user_id).cloned()
    }

    /// Seed a minimal job row; assigned jobs start out `accepted`.
    pub fn add_job(&self, id: &str, title: &str, requester_id: &str, worker_id: Option<&str>) {
        self.put_job(Job {
            id: id.to_string(),
            requester_id: requester_id.to_string(),
            title: title.to_string(),
            category: String::new(),
            description: String::new(),
            address: None,
            address_area: None,
            budget: 0.0,
            worker_earnings: 0.0,
            platform_fee: 0.0,
            status: if worker_id.is_some() {
                JobStatus::Accepted
            } else {
                JobStatus::Posted
            },
            deadline: None,
            accepting_quotes: worker_id.is_none(),
            assigned_worker_id: worker_id.map(str::to_string),
            created_at: Utc::now(),
        });
    }

    /// Store a job row verbatim, replacing one with the same id.
    pub fn put_job(&self, job: Job) {
        let mut state = self.lock();
        state.jobs.retain(|existing| existing.id != job.id);
        state.jobs.push(job);
    }

    #[must_use]
    pub fn job_row(&self, job_id: &str) -> Option<Job> {
        self.lock().jobs.iter().find(|job| job.id == job_id).cloned()
    }

    /// Store a quote row verbatim, replacing one with the same id.
    pub fn put_quote(&self, quote: Quote) {
        let mut state = self.lock();
        state.quotes.retain(|existing| existing.id != quote.id);
        state.quotes.push(quote);
    }

    #[must_use]
    pub fn quote_row(&self, quote_id: &str) -> Option<Quote> {
        self.lock().quotes.iter().find(|quote| quote.id == quote_id).cloned()
    }

    /// Insert a message row and push it to matching feeds.
    pub fn push_message(&self, row: MessageRow) {
        let mut state = self.lock();
        state.messages.push(row.clone());
        state.publish(&MessageEvent::Insert(row));
    }

    #[must_use]
    pub fn messages(&self) -> Vec<MessageRow> {
        self.lock().messages.clone()
    }

    /// Start a session for `user_id` as if the user had just signed in.
    pub fn sign_in_as(&self, user_id: &str) -> Session {
        let session = self.issue(user_id, None);
        self.lock().current = Some(session.clone());
        session
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make only `op` (a trait method name) fail as a transport error.
    pub fn fail_op(&self, op: &'static str) {
        self.lock().failing.insert(op);
    }

    /// Undo [`fail_op`](Self::fail_op).
    pub fn recover_op(&self, op: &str) {
        self.lock().failing.remove(op);
    }

    /// Hold every later call to `op` until the returned gate is notified.
    /// Each `notify_one` releases one waiting call.
    pub fn gate(&self, op: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gates.insert(op, Arc::clone(&gate));
        gate
    }

    /// Number of calls to `op` that reached its gate.
    #[must_use]
    pub fn waiting(&self, op: &str) -> usize {
        self.lock().waiting.get(op).copied().unwrap_or(0)
    }

    /// Number of times `op` (a trait method name) was called.
    #[must_use]
    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// Number of live feed subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.feeds.retain(|(_, tx)| !tx.is_closed());
        state.feeds.len()
    }
}

#[async_trait]
impl Baas for MemoryBaas {
    async fn get_session(&self) -> Result<Option<Session>, BaasError> {
        let state = self.enter("get_session").await?;
        Ok(state.current.clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BaasError> {
        let account = {
            let state = self.enter("sign_in_with_password").await?;
            state.accounts.get(email).cloned()
        };
        let account = account
            .filter(|a| a.password == password)
            .ok_or_else(|| BaasError::Auth {
                status: 400,
                message: "Invalid login credentials".into(),
            })?;
        if !account.confirmed {
            return Err(BaasError::Auth {
                status: 400,
                message: "Email not confirmed".into(),
            });
        }
        let session = self.issue(&account.user_id, Some(email.to_string()));
        self.lock().current = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BaasError> {
        let mut state = self.enter("sign_up").await?;
        if state.accounts.contains_key(&request.email) {
            return Err(BaasError::Auth {
                status: 422,
                message: "User already registered".into(),
            });
        }
        let user_id = state.next_user_id();
        state.accounts.insert(
            request.email.clone(),
            Account {
                user_id: user_id.clone(),
                password: request.password.clone(),
                confirmed: false,
            },
        );
        tracing::debug!(%user_id, redirect_to = %request.redirect_to, "verification email queued");
        Ok(SignUpOutcome {
            user_id,
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), BaasError> {
        let mut state = self.enter("sign_out").await?;
        state.current = None;
        Ok(())
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, BaasError> {
        let known = {
            let state = self.enter("set_session").await?;
            state.accounts.values().map(|a| a.user_id.clone()).collect::<Vec<_>>()
        };
        let invalid = || BaasError::Auth {
            status: 401,
            message: "Invalid token".into(),
        };
        let user_id = jwt::decode_subject(access_token).map_err(|_| invalid())?;
        if !known.contains(&user_id) {
            return Err(invalid());
        }
        let session = Session {
            user_id,
            email: None,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: jwt::decode_expiry(access_token).ok(),
        };
        self.lock().current = Some(session.clone());
        Ok(session)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawProfile>, BaasError> {
        let state = self.enter("fetch_profile").await?;
        state
            .profiles
            .get(user_id)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| BaasError::Decode(format!("users row {user_id}: {e}")))
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BaasError> {
        let mut state = self.enter("insert_profile").await?;
        if state.profiles.contains_key(&profile.id) {
            return Err(BaasError::Rejected {
                status: 409,
                message: format!("duplicate key value violates unique constraint \"users_pkey\" ({})", profile.id),
            });
        }
        let row = serde_json::to_value(profile)
            .map_err(|e| BaasError::Decode(format!("encode profile: {e}")))?;
        state.profiles.insert(profile.id.clone(), row);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), BaasError> {
        let mut state = self.enter("update_profile").await?;
        let patch = serde_json::to_value(patch)
            .map_err(|e| BaasError::Decode(format!("encode patch: {e}")))?;
        let row = state
            .profiles
            .get_mut(user_id)
            .and_then(serde_json::Value::as_object_mut)
            .ok_or_else(|| BaasError::Rejected {
                status: 404,
                message: format!("users row {user_id} not found"),
            })?;
        if let serde_json::Value::Object(fields) = patch {
            row.extend(fields);
        }
        Ok(())
    }

    async fn jobs_for_user(&self, user_id: &str) -> Result<Vec<JobSummary>, BaasError> {
        let state = self.enter("jobs_for_user").await?;
        Ok(state
            .jobs
            .iter()
            .filter(|job| {
                job.requester_id == user_id || job.assigned_worker_id.as_deref() == Some(user_id)
            })
            .map(|job| JobSummary {
                id: job.id.clone(),
                title: job.title.clone(),
            })
            .collect())
    }

    async fn open_jobs(&self) -> Result<Vec<Job>, BaasError> {
        let state = self.enter("open_jobs").await?;
        let rows = state
            .jobs
            .iter()
            .filter(|job| job.status == JobStatus::Posted)
            .cloned()
            .collect();
        Ok(newest_first(rows, |job: &Job| job.created_at))
    }

    async fn jobs_posted_by(&self, requester_id: &str) -> Result<Vec<Job>, BaasError> {
        let state = self.enter("jobs_posted_by").await?;
        let rows = state
            .jobs
            .iter()
            .filter(|job| job.requester_id == requester_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |job: &Job| job.created_at))
    }

    async fn jobs_assigned_to(&self, worker_id: &str) -> Result<Vec<Job>, BaasError> {
        let state = self.enter("jobs_assigned_to").await?;
        let rows = state
            .jobs
            .iter()
            .filter(|job| job.assigned_worker_id.as_deref() == Some(worker_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |job: &Job| job.created_at))
    }

    async fn job(&self, job_id: &str) -> Result<Option<Job>, BaasError> {
        let state = self.enter("job").await?;
        Ok(state.jobs.iter().find(|job| job.id == job_id).cloned())
    }

    async fn insert_job(&self, job: &NewJob) -> Result<Job, BaasError> {
        let mut state = self.enter("insert_job").await?;
        let row = Job {
            id: state.next_row_id("job"),
            requester_id: job.requester_id.clone(),
            title: job.title.clone(),
            category: job.category.clone(),
            description: job.description.clone(),
            address: job.address.clone(),
            address_area: job.address_area.clone(),
            budget: job.budget,
            worker_earnings: job.worker_earnings,
            platform_fee: job.platform_fee,
            status: job.status,
            deadline: job.deadline,
            accepting_quotes: job.accepting_quotes,
            assigned_worker_id: None,
            created_at: Utc::now(),
        };
        state.jobs.push(row.clone());
        Ok(row)
    }

    async fn update_job(&self, job_id: &str, patch: &JobPatch) -> Result<(), BaasError> {
        let mut state = self.enter("update_job").await?;
        let job = state.job_mut(job_id)?;
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(worker_id) = &patch.assigned_worker_id {
            job.assigned_worker_id = Some(worker_id.clone());
        }
        if let Some(accepting) = patch.accepting_quotes {
            job.accepting_quotes = accepting;
        }
        Ok(())
    }

    async fn quotes_for_job(&self, job_id: &str) -> Result<Vec<Quote>, BaasError> {
        let state = self.enter("quotes_for_job").await?;
        let rows = state
            .quotes
            .iter()
            .filter(|quote| quote.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |quote: &Quote| quote.created_at))
    }

    async fn quotes_by_worker(&self, worker_id: &str) -> Result<Vec<Quote>, BaasError> {
        let state = self.enter("quotes_by_worker").await?;
        let rows = state
            .quotes
            .iter()
            .filter(|quote| quote.worker_id == worker_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |quote: &Quote| quote.created_at))
    }

    async fn quote(&self, quote_id: &str) -> Result<Option<Quote>, BaasError> {
        let state = self.enter("quote").await?;
        Ok(state.quotes.iter().find(|quote| quote.id == quote_id).cloned())
    }

    async fn insert_quote(&self, quote: &NewQuote) -> Result<Quote, BaasError> {
        let mut state = self.enter("insert_quote").await?;
        let duplicate = state
            .quotes
            .iter()
            .any(|existing| existing.job_id == quote.job_id && existing.worker_id == quote.worker_id);
        if duplicate {
            return Err(BaasError::Rejected {
                status: 409,
                message: format!(
                    "duplicate key value violates unique constraint \"quotes_job_id_worker_id_key\" ({}, {})",
                    quote.job_id, quote.worker_id
                ),
            });
        }
        let row = Quote {
            id: state.next_row_id("quote"),
            job_id: quote.job_id.clone(),
            worker_id: quote.worker_id.clone(),
            quoted_amount: quote.quoted_amount,
            message: quote.message.clone(),
            status: quote.status,
            created_at: Utc::now(),
        };
        state.quotes.push(row.clone());
        Ok(row)
    }

    async fn update_quote(&self, quote_id: &str, patch: &QuotePatch) -> Result<(), BaasError> {
        let mut state = self.enter("update_quote").await?;
        let quote = state.quote_mut(quote_id)?;
        if let Some(amount) = patch.quoted_amount {
            quote.quoted_amount = amount;
        }
        if let Some(message) = &patch.message {
            quote.message.clone_from(message);
        }
        if let Some(status) = patch.status {
            quote.status = status;
        }
        Ok(())
    }

    async fn unread_messages(
        &self,
        job_ids: &[String],
        exclude_sender: &str,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BaasError> {
        let state = self.enter("unread_messages").await?;
        let mut rows: Vec<MessageRow> = state
            .messages
            .iter()
            .filter(|m| !m.is_read && m.from_user_id != exclude_sender && job_ids.contains(&m.job_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_messages_read(&self, job_id: &str, reader_id: &str) -> Result<(), BaasError> {
        let mut state = self.enter("mark_messages_read").await?;
        let mut updated = Vec::new();
        for message in &mut state.messages {
            if message.job_id == job_id && message.to_user_id == reader_id && !message.is_read {
                message.is_read = true;
                updated.push(message.clone());
            }
        }
        for row in updated {
            state.publish(&MessageEvent::Update(row));
        }
        Ok(())
    }

    async fn user_name(&self, user_id: &str) -> Result<Option<String>, BaasError> {
        let state = self.enter("user_name").await?;
        Ok(state
            .profiles
            .get(user_id)
            .and_then(|row| row.get("name"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    async fn job_title(&self, job_id: &str) -> Result<Option<String>, BaasError> {
        let state = self.enter("job_title").await?;
        Ok(state
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .map(|job| job.title.clone()))
    }

    fn subscribe_messages(&self, filter: MessageFilter) -> MessageSubscription {
        let (tx, subscription) = MessageSubscription::channel();
        self.lock().feeds.push((filter, tx));
        subscription
    }
}
