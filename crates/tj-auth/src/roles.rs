//! Role normalization.
//!
//! Profile rows store their roles in whatever shape was current when they were
//! written: a JSON array, a JSON-encoded array inside a string, a bracketed
//! single-quoted string from an older writer, or nothing but the legacy
//! scalar `role` column. [`normalize`] turns all of them into a [`RoleSet`].
//! Nothing downstream ever inspects the raw encodings.

use serde_json::Value;
use tj_baas::RawProfile;
use tj_core::{RoleSet, RoleTag};

/// Canonical role set of a stored profile row.
#[must_use]
pub fn normalize_profile(profile: &RawProfile) -> RoleSet {
    normalize(&profile.roles, profile.role.as_deref())
}

/// Normalize a raw `roles` value plus the legacy scalar.
///
/// Unknown tags are dropped. When nothing valid remains and `legacy` names a
/// known role, the set is seeded from it. Normalizing an already-normalized
/// set is the identity.
#[must_use]
pub fn normalize(raw: &Value, legacy: Option<&str>) -> RoleSet {
    let candidates = match raw {
        Value::Array(items) => strings_of(items),
        Value::String(text) => parse_text(text),
        _ => Vec::new(),
    };

    let mut roles: RoleSet = candidates
        .iter()
        .filter_map(|tag| {
            let role = RoleTag::parse(tag);
            if role.is_none() {
                tracing::debug!(tag = %tag, "dropping unknown role tag");
            }
            role
        })
        .collect();

    if roles.is_empty() {
        if let Some(role) = legacy.and_then(RoleTag::parse) {
            roles.insert(role);
        }
    }
    roles
}

fn strings_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_owned))
        .collect()
}

fn parse_text(text: &str) -> Vec<String> {
    parse_encoded(text, 1)
}

/// `depth` bounds how many times a string may wrap another encoding.
fn parse_encoded(text: &str, depth: u8) -> Vec<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => strings_of(&items),
        Ok(Value::String(inner)) if depth > 0 => parse_encoded(&inner, depth - 1),
        Ok(Value::String(single)) => vec![single],
        _ => bracket_list(text),
    }
}

/// Legacy `['a','b']` / `[a, b]` / `a,b` strings.
fn bracket_list(text: &str) -> Vec<String> {
    let inner = text
        .find('[')
        .and_then(|open| {
            let rest = &text[open + 1..];
            rest.find(']').map(|close| &rest[..close])
        })
        .unwrap_or(text);

    inner
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}
