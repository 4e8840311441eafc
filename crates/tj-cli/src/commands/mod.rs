mod guard;
mod inbox;
mod jobs;
mod login;
mod logout;
mod profile;
mod register;
mod switch;
mod verify;
mod whoami;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Login(args) => login::handle(&args, ctx, flags).await,
        Commands::Register(args) => register::handle(&args, ctx, flags).await,
        Commands::Logout => logout::handle(ctx, flags).await,
        Commands::Whoami => whoami::handle(ctx, flags).await,
        Commands::Switch(args) => switch::handle(&args, ctx, flags),
        Commands::Guard(args) => guard::handle(&args, ctx, flags).await,
        Commands::Verify(args) => verify::handle(&args, ctx, flags).await,
        Commands::Inbox { action } => inbox::handle(&action, ctx, flags).await,
        Commands::Jobs { action } => jobs::handle(&action, ctx, flags).await,
        Commands::Profile(args) => profile::handle(&args, ctx, flags).await,
    }
}
