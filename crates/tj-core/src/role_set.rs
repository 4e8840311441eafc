//! Ordered, duplicate-free set of role tags.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::enums::RoleTag;

/// The canonical role set of an identity.
///
/// Insertion order is preserved and the first element is the primary role.
/// Order carries no other precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct RoleSet(Vec<RoleTag>);

impl RoleSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn single(role: RoleTag) -> Self {
        Self(vec![role])
    }

    /// Append `role` unless already held. Returns `true` if it was added.
    pub fn insert(&mut self, role: RoleTag) -> bool {
        if self.0.contains(&role) {
            return false;
        }
        self.0.push(role);
        true
    }

    #[must_use]
    pub fn contains(&self, role: RoleTag) -> bool {
        self.0.contains(&role)
    }

    /// First held role, the default for context selection.
    #[must_use]
    pub fn primary(&self) -> Option<RoleTag> {
        self.0.first().copied()
    }

    /// The only held role, if exactly one is held.
    #[must_use]
    pub fn sole(&self) -> Option<RoleTag> {
        match self.0.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleTag> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[RoleTag] {
        &self.0
    }
}

impl FromIterator<RoleTag> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleTag>>(iter: I) -> Self {
        let mut set = Self::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<RoleTag>::deserialize(deserializer)?;
        Ok(roles.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(role.as_str())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collect_drops_duplicates_keeping_first() {
        let set: RoleSet = [RoleTag::Worker, RoleTag::Requester, RoleTag::Worker]
            .into_iter()
            .collect();
        assert_eq!(set.as_slice(), &[RoleTag::Worker, RoleTag::Requester]);
        assert_eq!(set.primary(), Some(RoleTag::Worker));
    }

    #[test]
    fn sole_only_for_single_member() {
        assert_eq!(RoleSet::single(RoleTag::Affiliate).sole(), Some(RoleTag::Affiliate));
        let both: RoleSet = [RoleTag::Requester, RoleTag::Worker].into_iter().collect();
        assert_eq!(both.sole(), None);
        assert_eq!(RoleSet::new().sole(), None);
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = RoleSet::single(RoleTag::Requester);
        assert!(!set.insert(RoleTag::Requester));
        assert!(set.insert(RoleTag::Worker));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn deserialize_dedups() {
        let set: RoleSet = serde_json::from_str(r#"["worker","worker","requester"]"#).unwrap();
        assert_eq!(set.as_slice(), &[RoleTag::Worker, RoleTag::Requester]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["worker","requester"]"#);
    }

    #[test]
    fn display_joins_tags() {
        let set: RoleSet = [RoleTag::Requester, RoleTag::Worker].into_iter().collect();
        assert_eq!(set.to_string(), "requester, worker");
        assert_eq!(RoleSet::new().to_string(), "");
    }
}
