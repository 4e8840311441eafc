//! # tj-inbox
//!
//! The notification dropdown's data: one entry per job with unread messages
//! from other people, carrying the latest message and how many are unread.
//! Entries are derived from the row store on [`Inbox::load`] and kept current
//! from the message change feed with [`Inbox::apply`].

pub mod error;
pub mod time;

pub use error::InboxError;
pub use time::relative_time;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_baas::{Baas, MessageEvent, MessageFilter, MessageSubscription};
use tj_core::MessageRow;

pub const DEFAULT_LIMIT: usize = 10;

const UNKNOWN_SENDER: &str = "Unknown";
const UNKNOWN_JOB: &str = "Job";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub job_id: String,
    pub job_title: String,
    /// Latest unread message on the job.
    pub message_id: String,
    pub from_user_id: String,
    pub sender_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub unread: usize,
}

pub struct Inbox {
    baas: Arc<dyn Baas>,
    user_id: String,
    limit: usize,
    entries: Vec<Notification>,
    names: HashMap<String, String>,
}

impl Inbox {
    pub fn new(baas: Arc<dyn Baas>, user_id: impl Into<String>, limit: usize) -> Self {
        Self {
            baas,
            user_id: user_id.into(),
            limit: limit.max(1),
            entries: Vec::new(),
            names: HashMap::new(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Current entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Total unread messages across all entries.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.entries.iter().map(|n| n.unread).sum()
    }

    /// Rebuild from the row store.
    ///
    /// # Errors
    ///
    /// `InboxError::Load` if jobs or messages cannot be read. Existing
    /// entries are kept in that case.
    pub async fn load(&mut self) -> Result<&[Notification], InboxError> {
        let jobs = self
            .baas
            .jobs_for_user(&self.user_id)
            .await
            .map_err(InboxError::Load)?;
        if jobs.is_empty() {
            self.entries.clear();
            return Ok(&self.entries);
        }

        let titles: HashMap<String, String> =
            jobs.into_iter().map(|job| (job.id, job.title)).collect();
        let job_ids: Vec<String> = titles.keys().cloned().collect();
        let rows = self
            .baas
            .unread_messages(&job_ids, &self.user_id, self.limit)
            .await
            .map_err(InboxError::Load)?;

        let mut entries: Vec<Notification> = Vec::new();
        for row in rows {
            if let Some(entry) = entries.iter_mut().find(|n| n.job_id == row.job_id) {
                entry.unread += 1;
                continue;
            }
            let sender_name = self.sender_name(&row.from_user_id).await;
            let job_title = titles
                .get(&row.job_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_JOB.into());
            entries.push(notification(row, sender_name, job_title));
        }
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(self.limit);

        tracing::debug!(user_id = %self.user_id, entries = entries.len(), "inbox loaded");
        self.entries = entries;
        Ok(&self.entries)
    }

    /// Fold one change-feed event in. Returns whether the entries changed.
    pub async fn apply(&mut self, event: &MessageEvent) -> bool {
        match event {
            MessageEvent::Insert(row) => self.insert(row).await,
            MessageEvent::Update(row) => self.update(row),
        }
    }

    async fn insert(&mut self, row: &MessageRow) -> bool {
        if row.to_user_id != self.user_id || row.from_user_id == self.user_id || row.is_read {
            return false;
        }

        if let Some(index) = self.entries.iter().position(|n| n.job_id == row.job_id) {
            let mut entry = self.entries.remove(index);
            entry.unread += 1;
            entry.message_id.clone_from(&row.id);
            entry.body.clone_from(&row.body);
            entry.created_at = row.created_at;
            if entry.from_user_id != row.from_user_id {
                entry.sender_name = self.sender_name(&row.from_user_id).await;
                entry.from_user_id.clone_from(&row.from_user_id);
            }
            self.entries.insert(0, entry);
            return true;
        }

        let sender_name = self.sender_name(&row.from_user_id).await;
        let job_title = match self.baas.job_title(&row.job_id).await {
            Ok(Some(title)) => title,
            Ok(None) => UNKNOWN_JOB.into(),
            Err(error) => {
                tracing::warn!(%error, job_id = %row.job_id, "job title lookup failed");
                UNKNOWN_JOB.into()
            }
        };
        self.entries
            .insert(0, notification(row.clone(), sender_name, job_title));
        self.entries.truncate(self.limit);
        true
    }

    fn update(&mut self, row: &MessageRow) -> bool {
        if !row.is_read || row.to_user_id != self.user_id {
            return false;
        }
        let Some(index) = self.entries.iter().position(|n| n.job_id == row.job_id) else {
            return false;
        };
        let entry = &mut self.entries[index];
        entry.unread = entry.unread.saturating_sub(1);
        if entry.unread == 0 {
            self.entries.remove(index);
        }
        true
    }

    /// Mark every unread message on `job_id` read and drop its entry.
    ///
    /// # Errors
    ///
    /// `InboxError::MarkRead` if the row store rejects the update; the entry
    /// stays in that case.
    pub async fn mark_read(&mut self, job_id: &str) -> Result<(), InboxError> {
        self.baas
            .mark_messages_read(job_id, &self.user_id)
            .await
            .map_err(|source| InboxError::MarkRead {
                job_id: job_id.to_owned(),
                source,
            })?;
        self.entries.retain(|n| n.job_id != job_id);
        Ok(())
    }

    /// Change feed of messages addressed to this user.
    #[must_use]
    pub fn watch(&self) -> MessageSubscription {
        self.baas
            .subscribe_messages(MessageFilter::to_user(self.user_id.clone()))
    }

    /// Wait for the next feed event and apply it. `None` once the feed closes.
    pub async fn follow(&mut self, feed: &mut MessageSubscription) -> Option<bool> {
        let event = feed.recv().await?;
        Some(self.apply(&event).await)
    }

    async fn sender_name(&mut self, user_id: &str) -> String {
        if let Some(name) = self.names.get(user_id) {
            return name.clone();
        }
        let name = match self.baas.user_name(user_id).await {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => UNKNOWN_SENDER.into(),
            Err(error) => {
                tracing::warn!(%error, %user_id, "sender lookup failed");
                return UNKNOWN_SENDER.into();
            }
        };
        self.names.insert(user_id.to_owned(), name.clone());
        name
    }
}

fn notification(row: MessageRow, sender_name: String, job_title: String) -> Notification {
    Notification {
        job_id: row.job_id,
        job_title,
        message_id: row.id,
        from_user_id: row.from_user_id,
        sender_name,
        body: row.body,
        created_at: row.created_at,
        unread: 1,
    }
}
