use serde::Serialize;
use tj_auth::{GuardState, Mount, RouteGuard};
use tj_core::{AccountContext, RoleTag, Route};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::GuardArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct GuardResponse {
    required: RoleTag,
    dashboard: String,
    authorized: bool,
    user_id: Option<String>,
    context: Option<AccountContext>,
    redirect: Option<String>,
}

pub async fn handle(args: &GuardArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let guard = RouteGuard::new(args.role);
    let mount = Mount::new();
    let state = guard.check(&ctx.tab, &mount).await;

    let mut response = GuardResponse {
        required: guard.required(),
        dashboard: Route::Dashboard(guard.required()).path(),
        authorized: false,
        user_id: None,
        context: None,
        redirect: None,
    };
    match state {
        GuardState::Authorized(authorized) => {
            response.authorized = true;
            response.user_id = Some(authorized.identity.id);
            response.context = Some(authorized.context);
        }
        GuardState::Unauthorized { redirect } => response.redirect = Some(redirect.path()),
        GuardState::Checking | GuardState::Discarded => {}
    }
    output(&response, flags.format)
}
