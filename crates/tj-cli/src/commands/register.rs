use serde::Serialize;
use tj_auth::flows::{self, RegisterFlow, RegistrationForm};
use tj_core::{Notice, RoleTag};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RegisterArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct RegisterResponse {
    user_id: String,
    role: RoleTag,
    existing_account: bool,
    landing: String,
    notice: Notice,
}

pub async fn handle(
    args: &RegisterArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let Some(role) = flows::signup_role(&ctx.tab, args.role.as_deref()) else {
        anyhow::bail!(
            "choose a role with --role ({}); see {}",
            RoleTag::ALL.map(RoleTag::as_str).join(", "),
            ctx.landing().unwrap_or_default()
        );
    };

    let form = RegistrationForm {
        name: args.name.clone(),
        email: args.email.clone(),
        phone: args.phone.clone(),
        password: args.password.clone(),
        confirm_password: args.confirm_password.clone(),
        city: args.city.clone(),
    };
    let flow = RegisterFlow::new(
        &ctx.config.general.site_url,
        &ctx.config.general.default_city,
    );
    let outcome = flow
        .register(&ctx.tab, &form, role)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_notice("Registration Failed").description))?;

    output(
        &RegisterResponse {
            user_id: outcome.user_id,
            role,
            existing_account: outcome.existing_account,
            landing: outcome.route.path(),
            notice: outcome.notice,
        },
        flags.format,
    )
}
