//! Typed access to the persisted client keys.
//!
//! Every write to the six auth keys goes through [`ClientStore`]. Flows never
//! touch the raw [`Storage`] directly, which keeps the cached identity, role
//! set, selected role, and account context consistent with each other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tj_core::{AccountContext, Identity, IdentitySnapshot, RoleSet, RoleTag, Session, TokenStamp};

use crate::error::AuthError;
use crate::roles;
use crate::storage::{Storage, StorageWatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    UserToken,
    UserTokenData,
    UserInfo,
    UserRole,
    UserRoles,
    CurrentAccountType,
}

impl StorageKey {
    pub const ALL: [Self; 6] = [
        Self::UserToken,
        Self::UserTokenData,
        Self::UserInfo,
        Self::UserRole,
        Self::UserRoles,
        Self::CurrentAccountType,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserToken => "user_token",
            Self::UserTokenData => "user_token_data",
            Self::UserInfo => "user_info",
            Self::UserRole => "user_role",
            Self::UserRoles => "user_roles",
            Self::CurrentAccountType => "current_account_type",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

#[derive(Clone)]
pub struct ClientStore {
    backend: Arc<dyn Storage>,
}

impl ClientStore {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self { backend }
    }

    fn get(&self, key: StorageKey) -> Option<String> {
        self.backend.get(key.as_str())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), AuthError> {
        self.backend.set(key.as_str(), value)
    }

    fn set_json<T: serde::Serialize>(&self, key: StorageKey, value: &T) -> Result<(), AuthError> {
        let body = serde_json::to_string(value)
            .map_err(|e| AuthError::Storage(format!("encode {}: {e}", key.as_str())))?;
        self.set(key, &body)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let body = self.get(key)?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(key = key.as_str(), %error, "ignoring unreadable stored value");
                None
            }
        }
    }

    // --- session ---

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend rejects the write.
    pub fn save_session(&self, session: &Session, now: DateTime<Utc>) -> Result<(), AuthError> {
        self.set(StorageKey::UserToken, &session.access_token)?;
        self.set_json(
            StorageKey::UserTokenData,
            &TokenStamp::new(session.access_token.clone(), now),
        )
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.get(StorageKey::UserToken).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn token_stamp(&self) -> Option<TokenStamp> {
        self.get_json(StorageKey::UserTokenData)
    }

    // --- identity ---

    /// Cache `identity` as the `user_info` snapshot plus the `user_roles` list.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend rejects the write.
    pub fn save_identity(&self, identity: &Identity, now: DateTime<Utc>) -> Result<(), AuthError> {
        self.set_json(StorageKey::UserInfo, &identity.snapshot(now))?;
        self.set_json(StorageKey::UserRoles, &identity.roles)
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.get_json::<IdentitySnapshot>(StorageKey::UserInfo)
            .map(Identity::from)
    }

    /// Cached role set. Falls back to the roles inside the identity snapshot
    /// when the list itself is missing or unreadable.
    #[must_use]
    pub fn roles(&self) -> RoleSet {
        let cached = self
            .get(StorageKey::UserRoles)
            .map(|body| roles::normalize(&serde_json::Value::String(body), None))
            .unwrap_or_default();
        if cached.is_empty() {
            self.identity().map(|i| i.roles).unwrap_or_default()
        } else {
            cached
        }
    }

    // --- selections ---

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend rejects the write.
    pub fn save_selected_role(&self, role: RoleTag) -> Result<(), AuthError> {
        self.set(StorageKey::UserRole, role.as_str())
    }

    #[must_use]
    pub fn selected_role(&self) -> Option<RoleTag> {
        self.get(StorageKey::UserRole)
            .and_then(|value| RoleTag::parse(&value))
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend rejects the write.
    pub fn save_account_context(&self, context: AccountContext) -> Result<(), AuthError> {
        self.set(StorageKey::CurrentAccountType, context.as_persisted())
    }

    /// Stored context preference. Legacy aliases are accepted; anything
    /// unrecognized reads as no preference.
    #[must_use]
    pub fn account_context(&self) -> Option<AccountContext> {
        self.get(StorageKey::CurrentAccountType)
            .and_then(|value| AccountContext::from_persisted(&value))
    }

    // --- lifecycle ---

    /// Remove every auth key. All removals are attempted; the first failure
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the first `AuthError::Storage` raised by the backend.
    pub fn clear(&self) -> Result<(), AuthError> {
        let mut first_error = None;
        for key in StorageKey::ALL {
            if let Err(error) = self.backend.remove(key.as_str()) {
                tracing::warn!(key = key.as_str(), %error, "failed to clear client key");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Auth keys currently present.
    #[must_use]
    pub fn present_keys(&self) -> Vec<StorageKey> {
        StorageKey::ALL
            .into_iter()
            .filter(|key| self.get(*key).is_some())
            .collect()
    }

    #[must_use]
    pub fn watch(&self) -> Option<StorageWatch> {
        self.backend.watch()
    }
}
