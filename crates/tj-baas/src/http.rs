//! REST client for a Supabase-style project.
//!
//! Auth goes through the GoTrue endpoints under `/auth/v1`, rows through the
//! PostgREST endpoints under `/rest/v1`. The current session is held in memory
//! and, when a [`TokenFile`] is attached, persisted across runs. The message
//! change feed is emulated by polling `messages` for rows newer than the last
//! one seen.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tj_core::{Job, JobSummary, MessageRow, Quote, Session};
use tokio::sync::mpsc;

use crate::error::BaasError;
use crate::jwt;
use crate::subscription::MessageSubscription;
use crate::token_store::TokenFile;
use crate::types::{
    JobPatch, MessageEvent, MessageFilter, NewJob, NewProfile, NewQuote, ProfilePatch, QuotePatch,
    RawProfile, SignUpOutcome, SignUpRequest,
};
use crate::Baas;

/// Refresh access tokens expiring within this window.
const EXPIRY_BUFFER_SECS: i64 = 60;

#[derive(Debug, Clone, Copy)]
enum Scope {
    Auth,
    Rest,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| jwt::decode_expiry(&self.access_token).ok());
        Session {
            user_id: self.user.id,
            email: self.user.email,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NameRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    #[serde(default)]
    title: Option<String>,
}

/// Connection details shared with background pollers.
#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl Endpoint {
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{table}", self.base_url)
        } else {
            format!("{}/rest/v1/{table}?{query}", self.base_url)
        }
    }

    fn get(&self, url: &str, bearer: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn post(&self, url: &str, bearer: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn patch(&self, url: &str, bearer: &str) -> reqwest::RequestBuilder {
        self.client
            .patch(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

pub struct HttpBaas {
    endpoint: Endpoint,
    poll_interval: Duration,
    tokens: Option<TokenFile>,
    session: RwLock<Option<Session>>,
}

impl std::fmt::Debug for HttpBaas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBaas")
            .field("base_url", &self.endpoint.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl HttpBaas {
    /// Build a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BaasError::Unavailable` if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        anon_key: &str,
        request_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, BaasError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BaasError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            endpoint: Endpoint {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
            },
            poll_interval,
            tokens: None,
            session: RwLock::new(None),
        })
    }

    /// Persist the session in `file`, restoring whatever it already holds.
    #[must_use]
    pub fn with_token_file(mut self, file: TokenFile) -> Self {
        let restored = file.load();
        if let Some(session) = &restored {
            tracing::debug!(user_id = %session.user_id, "restored auth session from token file");
        }
        *self.session.get_mut().unwrap_or_else(PoisonError::into_inner) = restored;
        self.tokens = Some(file);
        self
    }

    fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn adopt(&self, session: Option<Session>) {
        if let Some(file) = &self.tokens {
            let result = match &session {
                Some(session) => file.store(session),
                None => file.delete(),
            };
            if let Err(error) = result {
                tracing::warn!(%error, "failed to persist auth session");
            }
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Access token of the current session, or the anonymous key.
    fn bearer(&self) -> String {
        self.current()
            .map_or_else(|| self.endpoint.anon_key.clone(), |s| s.access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BaasError> {
        let url = self.endpoint.auth_url("token?grant_type=refresh_token");
        let response = self
            .endpoint
            .post(&url, &self.endpoint.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = read_json(response, Scope::Auth).await?;
        Ok(token.into_session())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, BaasError> {
        let response = self
            .endpoint
            .get(&self.endpoint.rest_url(table, query), &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        read_json(response, Scope::Rest).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, BaasError> {
        let rows = self.select(table, &format!("select=*&id=eq.{}", enc(id))).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and read back what the store kept.
    async fn insert_returning<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, BaasError> {
        let response = self
            .endpoint
            .post(&self.endpoint.rest_url(table, ""), &self.bearer())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<T> = read_json(response, Scope::Rest).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BaasError::Decode(format!("insert into {table} returned no row")))
    }

    async fn patch_by_id<B: Serialize + Sync>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<(), BaasError> {
        let url = self.endpoint.rest_url(table, &format!("id=eq.{}", enc(id)));
        let response = self
            .endpoint
            .patch(&url, &self.bearer())
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check(response, Scope::Rest).await.map(|_| ())
    }
}

fn transport(error: reqwest::Error) -> BaasError {
    BaasError::Unavailable(error.to_string())
}

fn enc(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .into_iter()
                .find_map(|key| value.get(key).and_then(serde_json::Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

async fn check(response: reqwest::Response, scope: Scope) -> Result<reqwest::Response, BaasError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    if status.is_server_error() {
        return Err(BaasError::Unavailable(format!("HTTP {status}: {message}")));
    }
    Err(match scope {
        Scope::Auth => BaasError::Auth {
            status: status.as_u16(),
            message,
        },
        Scope::Rest => BaasError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    scope: Scope,
) -> Result<T, BaasError> {
    check(response, scope)
        .await?
        .json()
        .await
        .map_err(|e| BaasError::Decode(e.to_string()))
}

async fn fetch_new_messages(
    endpoint: &Endpoint,
    bearer: &str,
    filter: &MessageFilter,
    since: DateTime<Utc>,
) -> Result<Vec<MessageRow>, BaasError> {
    let query = format!(
        "select=*&to_user_id=eq.{}&created_at=gt.{}&order=created_at.asc",
        enc(&filter.to_user_id),
        enc(&since.to_rfc3339()),
    );
    let response = endpoint
        .get(&endpoint.rest_url("messages", &query), bearer)
        .send()
        .await
        .map_err(transport)?;
    read_json(response, Scope::Rest).await
}

async fn poll_messages(
    endpoint: Endpoint,
    bearer: String,
    filter: MessageFilter,
    every: Duration,
    tx: mpsc::Sender<MessageEvent>,
) {
    let mut since = Utc::now();
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if tx.is_closed() {
            return;
        }
        match fetch_new_messages(&endpoint, &bearer, &filter, since).await {
            Ok(rows) => {
                for row in rows {
                    since = since.max(row.created_at);
                    if tx.send(MessageEvent::Insert(row)).await.is_err() {
                        return;
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, filter = %filter.expression(), "message feed poll failed");
            }
        }
    }
}

#[async_trait]
impl Baas for HttpBaas {
    async fn get_session(&self) -> Result<Option<Session>, BaasError> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        let threshold = Utc::now() + chrono::TimeDelta::seconds(EXPIRY_BUFFER_SECS);
        if !session.is_expired_at(threshold) {
            return Ok(Some(session));
        }

        tracing::debug!(user_id = %session.user_id, "access token near expiry; refreshing");
        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.adopt(Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(BaasError::Auth { message, .. }) => {
                tracing::warn!(%message, "refresh token rejected; dropping session");
                self.adopt(None);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BaasError> {
        let url = self.endpoint.auth_url("token?grant_type=password");
        let response = self
            .endpoint
            .post(&url, &self.endpoint.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = read_json(response, Scope::Auth).await?;
        let session = token.into_session();
        self.adopt(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BaasError> {
        let url = self
            .endpoint
            .auth_url(&format!("signup?redirect_to={}", enc(&request.redirect_to)));
        let response = self
            .endpoint
            .post(&url, &self.endpoint.anon_key)
            .json(&serde_json::json!({
                "email": request.email,
                "password": request.password,
                "data": request.metadata,
            }))
            .send()
            .await
            .map_err(transport)?;
        let body: serde_json::Value = read_json(response, Scope::Auth).await?;

        // With confirmation disabled the service answers with a full session;
        // otherwise with the bare user object.
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| BaasError::Decode(format!("signup session: {e}")))?;
            let session = token.into_session();
            self.adopt(Some(session.clone()));
            return Ok(SignUpOutcome {
                user_id: session.user_id.clone(),
                session: Some(session),
            });
        }
        let user: AuthUser = serde_json::from_value(body.get("user").cloned().unwrap_or(body))
            .map_err(|e| BaasError::Decode(format!("signup user: {e}")))?;
        Ok(SignUpOutcome {
            user_id: user.id,
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), BaasError> {
        let Some(session) = self.current() else {
            return Ok(());
        };
        self.adopt(None);
        let url = self.endpoint.auth_url("logout");
        let response = self
            .endpoint
            .post(&url, &session.access_token)
            .send()
            .await
            .map_err(transport)?;
        check(response, Scope::Auth).await.map(|_| ())
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, BaasError> {
        let url = self.endpoint.auth_url("user");
        let response = self
            .endpoint
            .get(&url, access_token)
            .send()
            .await
            .map_err(transport)?;
        let user: AuthUser = read_json(response, Scope::Auth).await?;
        let session = Session {
            user_id: user.id,
            email: user.email,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: jwt::decode_expiry(access_token).ok(),
        };
        self.adopt(Some(session.clone()));
        Ok(session)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<RawProfile>, BaasError> {
        let url = self
            .endpoint
            .rest_url("users", &format!("select=*&id=eq.{}", enc(user_id)));
        let response = self
            .endpoint
            .get(&url, &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<RawProfile> = read_json(response, Scope::Rest).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BaasError> {
        let url = self.endpoint.rest_url("users", "");
        let response = self
            .endpoint
            .post(&url, &self.bearer())
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await
            .map_err(transport)?;
        check(response, Scope::Rest).await.map(|_| ())
    }

    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), BaasError> {
        let url = self
            .endpoint
            .rest_url("users", &format!("id=eq.{}", enc(user_id)));
        let response = self
            .endpoint
            .patch(&url, &self.bearer())
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(transport)?;
        check(response, Scope::Rest).await.map(|_| ())
    }

    async fn jobs_for_user(&self, user_id: &str) -> Result<Vec<JobSummary>, BaasError> {
        let or = format!("(requester_id.eq.{user_id},assigned_worker_id.eq.{user_id})");
        let url = self
            .endpoint
            .rest_url("jobs", &format!("select=id,title&or={}", enc(&or)));
        let response = self
            .endpoint
            .get(&url, &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        read_json(response, Scope::Rest).await
    }

    async fn open_jobs(&self) -> Result<Vec<Job>, BaasError> {
        self.select("jobs", "select=*&status=eq.posted&order=created_at.desc")
            .await
    }

    async fn jobs_posted_by(&self, requester_id: &str) -> Result<Vec<Job>, BaasError> {
        let query = format!(
            "select=*&requester_id=eq.{}&order=created_at.desc",
            enc(requester_id)
        );
        self.select("jobs", &query).await
    }

    async fn jobs_assigned_to(&self, worker_id: &str) -> Result<Vec<Job>, BaasError> {
        let query = format!(
            "select=*&assigned_worker_id=eq.{}&order=created_at.desc",
            enc(worker_id)
        );
        self.select("jobs", &query).await
    }

    async fn job(&self, job_id: &str) -> Result<Option<Job>, BaasError> {
        self.select_one("jobs", job_id).await
    }

    async fn insert_job(&self, job: &NewJob) -> Result<Job, BaasError> {
        self.insert_returning("jobs", job).await
    }

    async fn update_job(&self, job_id: &str, patch: &JobPatch) -> Result<(), BaasError> {
        self.patch_by_id("jobs", job_id, patch).await
    }

    async fn quotes_for_job(&self, job_id: &str) -> Result<Vec<Quote>, BaasError> {
        let query = format!("select=*&job_id=eq.{}&order=created_at.desc", enc(job_id));
        self.select("quotes", &query).await
    }

    async fn quotes_by_worker(&self, worker_id: &str) -> Result<Vec<Quote>, BaasError> {
        let query = format!(
            "select=*&worker_id=eq.{}&order=created_at.desc",
            enc(worker_id)
        );
        self.select("quotes", &query).await
    }

    async fn quote(&self, quote_id: &str) -> Result<Option<Quote>, BaasError> {
        self.select_one("quotes", quote_id).await
    }

    async fn insert_quote(&self, quote: &NewQuote) -> Result<Quote, BaasError> {
        self.insert_returning("quotes", quote).await
    }

    async fn update_quote(&self, quote_id: &str, patch: &QuotePatch) -> Result<(), BaasError> {
        self.patch_by_id("quotes", quote_id, patch).await
    }

    async fn unread_messages(
        &self,
        job_ids: &[String],
        exclude_sender: &str,
        limit: usize,
    ) -> Result<Vec<MessageRow>, BaasError> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = format!("({})", job_ids.join(","));
        let query = format!(
            "select=*&job_id=in.{}&is_read=eq.false&from_user_id=neq.{}&order=created_at.desc&limit={limit}",
            enc(&ids),
            enc(exclude_sender),
        );
        let response = self
            .endpoint
            .get(&self.endpoint.rest_url("messages", &query), &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        read_json(response, Scope::Rest).await
    }

    async fn mark_messages_read(&self, job_id: &str, reader_id: &str) -> Result<(), BaasError> {
        let query = format!(
            "job_id=eq.{}&to_user_id=eq.{}&is_read=eq.false",
            enc(job_id),
            enc(reader_id),
        );
        let response = self
            .endpoint
            .patch(&self.endpoint.rest_url("messages", &query), &self.bearer())
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "is_read": true }))
            .send()
            .await
            .map_err(transport)?;
        check(response, Scope::Rest).await.map(|_| ())
    }

    async fn user_name(&self, user_id: &str) -> Result<Option<String>, BaasError> {
        let url = self
            .endpoint
            .rest_url("users", &format!("select=name&id=eq.{}", enc(user_id)));
        let response = self
            .endpoint
            .get(&url, &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<NameRow> = read_json(response, Scope::Rest).await?;
        Ok(rows.into_iter().next().and_then(|row| row.name))
    }

    async fn job_title(&self, job_id: &str) -> Result<Option<String>, BaasError> {
        let url = self
            .endpoint
            .rest_url("jobs", &format!("select=title&id=eq.{}", enc(job_id)));
        let response = self
            .endpoint
            .get(&url, &self.bearer())
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<TitleRow> = read_json(response, Scope::Rest).await?;
        Ok(rows.into_iter().next().and_then(|row| row.title))
    }

    fn subscribe_messages(&self, filter: MessageFilter) -> MessageSubscription {
        let (tx, subscription) = MessageSubscription::channel();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime; message feed disabled");
            return subscription;
        };
        let task = runtime.spawn(poll_messages(
            self.endpoint.clone(),
            self.bearer(),
            filter,
            self.poll_interval,
            tx,
        ));
        subscription.with_task(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpBaas {
        HttpBaas::new(
            "https://abcd.supabase.co/",
            "anon",
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let baas = client();
        assert_eq!(
            baas.endpoint.auth_url("token?grant_type=password"),
            "https://abcd.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            baas.endpoint.rest_url("users", "select=*"),
            "https://abcd.supabase.co/rest/v1/users?select=*"
        );
        assert_eq!(
            baas.endpoint.rest_url("users", ""),
            "https://abcd.supabase.co/rest/v1/users"
        );
    }

    #[test]
    fn error_message_prefers_description() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"Email not confirmed"}"#), "Email not confirmed");
        assert_eq!(error_message("  plain text "), "plain text");
    }

    #[test]
    fn token_response_prefers_explicit_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "not-a-jwt",
            "refresh_token": "r",
            "expires_at": 1_900_000_000,
            "user": { "id": "u-1", "email": "a@example.com" }
        }))
        .unwrap();
        let session = token.into_session();
        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let baas = client();
        assert_eq!(baas.bearer(), "anon");
    }

    #[test]
    fn token_file_restores_session() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let file = TokenFile::new(tmp.path().join("auth.json"));
        let session = Session {
            user_id: "u-1".into(),
            email: None,
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: None,
        };
        file.store(&session).unwrap();

        let baas = client().with_token_file(file);
        assert_eq!(baas.current(), Some(session));
        assert_eq!(baas.bearer(), "access");
    }

    #[tokio::test]
    async fn get_session_without_stored_session_is_none() {
        let baas = client();
        assert!(baas.get_session().await.unwrap().is_none());
    }
}
