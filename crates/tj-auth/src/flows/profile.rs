use chrono::Utc;
use serde::{Deserialize, Serialize};
use tj_baas::ProfilePatch;
use tj_core::{Identity, Notice};

use crate::error::AuthError;
use crate::Tab;

/// The editable part of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub city: String,
}

impl ProfileForm {
    /// Prefilled from the current identity.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            phone: identity.phone.clone(),
            city: identity.city.clone(),
        }
    }
}

/// Save `form` over the signed-in viewer's profile.
///
/// The row is patched first; the cached identity snapshot is rewritten only
/// after the backend accepted the change. Roles and email are never touched.
/// No auth event is published since the signed-in state did not change.
///
/// # Errors
///
/// `AuthError::Validation` for a blank name or phone, `AuthError::Backend` if
/// the row update fails, `AuthError::Storage` if the snapshot cannot be saved.
pub async fn update_profile(
    tab: &Tab,
    identity: &Identity,
    form: &ProfileForm,
) -> Result<(Identity, Notice), AuthError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Please enter your full name.".into()));
    }
    let phone = form.phone.trim();
    if phone.is_empty() {
        return Err(AuthError::Validation("Please enter your phone number.".into()));
    }

    let now = Utc::now();
    let patch = ProfilePatch {
        name: Some(name.to_string()),
        phone: Some(phone.to_string()),
        city: Some(form.city.trim().to_string()),
        ..ProfilePatch::default()
    }
    .touched(now);
    tab.baas.update_profile(&identity.id, &patch).await?;

    let updated = Identity {
        name: name.to_string(),
        phone: phone.to_string(),
        city: form.city.trim().to_string(),
        ..identity.clone()
    };
    tab.store.save_identity(&updated, now)?;
    tracing::info!(user_id = %updated.id, "profile updated");

    Ok((
        updated,
        Notice::success(
            "Profile Updated",
            "Your profile information has been updated successfully.",
        ),
    ))
}
