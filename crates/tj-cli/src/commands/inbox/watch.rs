use chrono::Utc;
use tj_inbox::Inbox;

use super::list::NotificationRow;
use crate::cli::GlobalFlags;
use crate::output::output;

/// Print the current entries, then the newest entry on every change until
/// interrupted.
pub async fn handle(inbox: &mut Inbox, flags: &GlobalFlags) -> anyhow::Result<()> {
    inbox.load().await?;
    let mut feed = inbox.watch();
    if !flags.quiet {
        eprintln!("{} unread; watching for new messages (Ctrl-C to stop)", inbox.unread_count());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = inbox.follow(&mut feed) => match changed {
                Some(true) => {
                    if let Some(latest) = inbox.entries().first() {
                        output(&NotificationRow::new(latest, Utc::now()), flags.format)?;
                    }
                }
                Some(false) => {}
                None => break,
            },
        }
    }
    Ok(())
}
