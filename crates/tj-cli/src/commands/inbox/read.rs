use serde::Serialize;
use tj_inbox::Inbox;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Serialize)]
struct ReadResponse {
    job_id: String,
    remaining_unread: usize,
}

pub async fn handle(inbox: &mut Inbox, job_id: &str, flags: &GlobalFlags) -> anyhow::Result<()> {
    inbox.load().await?;
    inbox.mark_read(job_id).await?;
    output(
        &ReadResponse {
            job_id: job_id.to_owned(),
            remaining_unread: inbox.unread_count(),
        },
        flags.format,
    )
}
