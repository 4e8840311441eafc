use chrono::{DateTime, Utc};
use serde::Serialize;
use tj_inbox::{Inbox, Notification, relative_time};

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Serialize)]
pub(super) struct NotificationRow {
    job_id: String,
    job: String,
    from: String,
    message: String,
    unread: usize,
    when: String,
}

impl NotificationRow {
    pub(super) fn new(notification: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            job_id: notification.job_id.clone(),
            job: notification.job_title.clone(),
            from: notification.sender_name.clone(),
            message: notification.body.clone(),
            unread: notification.unread,
            when: relative_time(notification.created_at, now),
        }
    }
}

pub async fn handle(inbox: &mut Inbox, flags: &GlobalFlags) -> anyhow::Result<()> {
    let now = Utc::now();
    let rows: Vec<NotificationRow> = inbox
        .load()
        .await?
        .iter()
        .map(|n| NotificationRow::new(n, now))
        .collect();
    output(&rows, flags.format)
}
