//! Transient user-facing notices (the toast of the original UI).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A dismissable message shown to the viewer. Never carries raw transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    #[must_use]
    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}
