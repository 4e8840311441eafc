use serde::Serialize;
use tj_auth::flows;
use tj_core::{AccountContext, Notice, RoleSet};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LoginArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct LoginResponse {
    user_id: String,
    name: String,
    roles: RoleSet,
    context: AccountContext,
    landing: String,
    notice: Notice,
}

pub async fn handle(args: &LoginArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let outcome = flows::sign_in(&ctx.tab, &args.email, &args.password, args.role)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_notice("Login Failed").description))?;

    output(
        &LoginResponse {
            user_id: outcome.identity.id,
            name: outcome.identity.name,
            roles: outcome.identity.roles,
            context: outcome.context,
            landing: outcome.route.path(),
            notice: outcome.notice,
        },
        flags.format,
    )
}
