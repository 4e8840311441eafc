use serde::Serialize;
use tj_auth::context;
use tj_core::AccountContext;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SwitchArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct SwitchResponse {
    context: AccountContext,
    mode: &'static str,
    landing: String,
}

pub fn handle(args: &SwitchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let route = context::switch(&ctx.tab, args.role)?;
    let switched = AccountContext::new(args.role);
    output(
        &SwitchResponse {
            context: switched,
            mode: switched.mode_name(),
            landing: route.path(),
        },
        flags.format,
    )
}
