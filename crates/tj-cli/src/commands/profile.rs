use anyhow::Context;
use serde::Serialize;
use tj_auth::flows::{self, ProfileForm};
use tj_core::Notice;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProfileArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct ProfileResponse {
    user_id: String,
    name: String,
    phone: String,
    city: String,
    notice: Notice,
}

pub async fn handle(args: &ProfileArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let identity = ctx
        .tab
        .store
        .identity()
        .context("not signed in; run `tj login` first")?;
    let current = ProfileForm::from_identity(&identity);
    let form = ProfileForm {
        name: args.name.clone().unwrap_or(current.name),
        phone: args.phone.clone().unwrap_or(current.phone),
        city: args.city.clone().unwrap_or(current.city),
    };
    let (updated, notice) = flows::update_profile(&ctx.tab, &identity, &form)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_notice("Error").description))?;

    output(
        &ProfileResponse {
            user_id: updated.id,
            name: updated.name,
            phone: updated.phone,
            city: updated.city,
            notice,
        },
        flags.format,
    )
}
