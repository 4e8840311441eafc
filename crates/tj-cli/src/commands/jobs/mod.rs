mod board;
mod requester;
mod worker;

use tj_auth::{Authorized, GuardState, Mount, RouteGuard};
use tj_core::RoleTag;
use tj_jobs::{JobsError, RequesterDesk, WorkerDesk};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::JobsCommands;
use crate::context::AppContext;

/// Handle `tj jobs <subcommand>`.
pub async fn handle(action: &JobsCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        JobsCommands::Browse(args) => board::handle(args, ctx, flags).await,
        JobsCommands::Post(args) => requester::post(args, &requester_desk(ctx).await?, flags).await,
        JobsCommands::Mine(args) => requester::mine(args, &requester_desk(ctx).await?, flags).await,
        JobsCommands::Quotes(args) => {
            requester::quotes(&args.job_id, &requester_desk(ctx).await?, flags).await
        }
        JobsCommands::Accept(args) => {
            requester::accept(&args.quote_id, &requester_desk(ctx).await?, flags).await
        }
        JobsCommands::Reject(args) => {
            requester::reject(&args.quote_id, &requester_desk(ctx).await?, flags).await
        }
        JobsCommands::Cancel(args) => {
            requester::cancel(&args.job_id, &requester_desk(ctx).await?, flags).await
        }
        JobsCommands::Quote(args) => worker::quote(args, &worker_desk(ctx).await?, flags).await,
        JobsCommands::MyQuotes => worker::my_quotes(&worker_desk(ctx).await?, flags).await,
        JobsCommands::Assigned => worker::assigned(&worker_desk(ctx).await?, flags).await,
        JobsCommands::Start(args) => worker::start(&args.job_id, &worker_desk(ctx).await?, flags).await,
    }
}

async fn requester_desk(ctx: &AppContext) -> anyhow::Result<RequesterDesk> {
    let authorized = admit(ctx, RoleTag::Requester).await?;
    RequesterDesk::open(ctx.tab.baas.clone(), &authorized).map_err(failed)
}

async fn worker_desk(ctx: &AppContext) -> anyhow::Result<WorkerDesk> {
    let authorized = admit(ctx, RoleTag::Worker).await?;
    WorkerDesk::open(ctx.tab.baas.clone(), &authorized).map_err(failed)
}

/// Run the role's dashboard guard; desks open only from its `Authorized` state.
async fn admit(ctx: &AppContext, role: RoleTag) -> anyhow::Result<Authorized> {
    match RouteGuard::new(role).check(&ctx.tab, &Mount::new()).await {
        GuardState::Authorized(authorized) => Ok(*authorized),
        GuardState::Unauthorized { redirect } => {
            anyhow::bail!("{role} access required; sign in at {}", redirect.path())
        }
        GuardState::Checking | GuardState::Discarded => {
            anyhow::bail!("access check for {role} did not finish")
        }
    }
}

fn failed(error: JobsError) -> anyhow::Error {
    anyhow::anyhow!(error.to_notice("Error").description)
}
