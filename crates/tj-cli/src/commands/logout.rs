use serde::Serialize;
use tj_auth::flows;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct LogoutResponse {
    cleared: bool,
    landing: String,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let route = flows::logout(&ctx.tab).await?;
    output(
        &LogoutResponse {
            cleared: true,
            landing: route.path(),
        },
        flags.format,
    )
}
