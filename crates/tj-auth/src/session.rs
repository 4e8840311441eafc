//! Session resolution.
//!
//! The auth service is the only source of truth for "is someone signed in".
//! Client storage is a cache; a stored token without a live session means
//! signed out.

use chrono::{DateTime, TimeDelta, Utc};
use tj_baas::Baas;
use tj_core::{Session, TokenStamp};

pub use tj_baas::jwt::decode_expiry;

/// Live session, or `None`. Lookup failures are logged and read as signed out.
pub async fn resolve(baas: &dyn Baas) -> Option<Session> {
    match baas.get_session().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!(%error, "session lookup failed; treating as signed out");
            None
        }
    }
}

/// Whether a cached token is older than `max_age`.
#[must_use]
pub fn is_stale(stamp: &TokenStamp, max_age: TimeDelta, now: DateTime<Utc>) -> bool {
    stamp.age(now) > max_age
}
