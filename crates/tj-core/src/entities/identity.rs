use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RoleTag;
use crate::role_set::RoleSet;

/// An authenticated person with a normalized role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    /// Issued by the auth service; never changes.
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    pub roles: RoleSet,
}

impl Identity {
    /// Legacy single-role scalar. Always `roles[0]`.
    #[must_use]
    pub fn legacy_role(&self) -> Option<RoleTag> {
        self.roles.primary()
    }

    /// Snapshot written to client storage as the cached identity.
    #[must_use]
    pub fn snapshot(&self, cached_at: DateTime<Utc>) -> IdentitySnapshot {
        IdentitySnapshot {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            city: self.city.clone(),
            roles: self.roles.clone(),
            role: self.legacy_role(),
            cached_at,
        }
    }
}

/// Cached identity as persisted under `user_info`.
///
/// Carries the legacy `role` scalar next to `roles` so older readers of the
/// snapshot keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentitySnapshot {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    pub roles: RoleSet,
    pub role: Option<RoleTag>,
    pub cached_at: DateTime<Utc>,
}

impl From<IdentitySnapshot> for Identity {
    fn from(snapshot: IdentitySnapshot) -> Self {
        // The legacy scalar is re-derived from `roles`; a diverging stored
        // value only matters when `roles` is empty.
        let roles = if snapshot.roles.is_empty() {
            snapshot.role.map(RoleSet::single).unwrap_or_default()
        } else {
            snapshot.roles
        };
        Self {
            id: snapshot.id,
            email: snapshot.email,
            name: snapshot.name,
            phone: snapshot.phone,
            city: snapshot.city,
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[RoleTag]) -> Identity {
        Identity {
            id: "u-1".into(),
            email: "dana@example.com".into(),
            name: "Dana".into(),
            phone: "555-0100".into(),
            city: "Houston".into(),
            roles: roles.iter().copied().collect(),
        }
    }

    #[test]
    fn legacy_role_tracks_first_role() {
        let id = identity(&[RoleTag::Worker, RoleTag::Requester]);
        assert_eq!(id.legacy_role(), Some(RoleTag::Worker));
        assert_eq!(id.snapshot(Utc::now()).role, Some(RoleTag::Worker));
    }

    #[test]
    fn snapshot_without_roles_falls_back_to_legacy_scalar() {
        let mut snapshot = identity(&[]).snapshot(Utc::now());
        snapshot.role = Some(RoleTag::Requester);
        let restored = Identity::from(snapshot);
        assert_eq!(restored.roles, RoleSet::single(RoleTag::Requester));
    }

    #[test]
    fn snapshot_round_trips_through_identity() {
        let id = identity(&[RoleTag::Requester, RoleTag::Worker]);
        assert_eq!(Identity::from(id.snapshot(Utc::now())), id);
    }
}
