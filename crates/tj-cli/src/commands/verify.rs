use serde::Serialize;
use tj_auth::flows;
use tj_core::Route;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::VerifyArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct VerifyResponse {
    verified: bool,
    landing: String,
}

pub async fn handle(args: &VerifyArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let route = flows::verify_email_link(&ctx.tab, &args.url).await;
    output(
        &VerifyResponse {
            verified: matches!(route, Route::EmailVerificationSuccess { .. }),
            landing: route.path(),
        },
        flags.format,
    )
}
