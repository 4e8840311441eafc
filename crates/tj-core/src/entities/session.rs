use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One authenticated browsing context, bound to a single identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    /// `exp` claim of the access token, when it could be decoded.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Access token plus the local time it was stored, persisted as `user_token_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenStamp {
    pub token: String,
    /// Milliseconds since the Unix epoch.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schemars(with = "i64")]
    pub timestamp: DateTime<Utc>,
}

impl TokenStamp {
    #[must_use]
    pub fn new(token: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            timestamp,
        }
    }

    /// Age of the stamp relative to `now`; negative ages clamp to zero.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::TimeDelta {
        (now - self.timestamp).max(chrono::TimeDelta::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_stamp_serializes_millis() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let stamp = TokenStamp::new("abc", ts);
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123_i64);
        assert_eq!(json["token"], "abc");
    }

    #[test]
    fn token_stamp_age_never_negative() {
        let now = Utc::now();
        let stamp = TokenStamp::new("abc", now + chrono::TimeDelta::minutes(5));
        assert_eq!(stamp.age(now), chrono::TimeDelta::zero());
    }

    #[test]
    fn session_expiry_check() {
        let now = Utc::now();
        let mut session = Session {
            user_id: "u-1".into(),
            email: None,
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: None,
        };
        assert!(!session.is_expired_at(now));
        session.expires_at = Some(now - chrono::TimeDelta::seconds(1));
        assert!(session.is_expired_at(now));
    }
}
