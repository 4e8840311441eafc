mod list;
mod read;
mod watch;

use anyhow::Context;
use tj_inbox::Inbox;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::InboxCommands;
use crate::context::AppContext;

/// Handle `tj inbox <subcommand>`.
pub async fn handle(
    action: &InboxCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut inbox = open(ctx, flags).await?;
    match action {
        InboxCommands::List => list::handle(&mut inbox, flags).await,
        InboxCommands::Watch => watch::handle(&mut inbox, flags).await,
        InboxCommands::Read(args) => read::handle(&mut inbox, &args.job_id, flags).await,
    }
}

async fn open(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<Inbox> {
    let session = tj_auth::session::resolve(ctx.tab.baas.as_ref())
        .await
        .context("not signed in; run `tj login` first")?;
    let limit = flags
        .limit
        .unwrap_or(ctx.config.general.notification_limit);
    Ok(Inbox::new(ctx.tab.baas.clone(), session.user_id, limit))
}
