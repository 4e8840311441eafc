use chrono::{TimeDelta, Utc};
use serde::Serialize;
use tj_auth::{NavModel, NavState, session};
use tj_core::{AccountContext, RoleSet, RoleTag};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct WhoamiResponse {
    signed_in: bool,
    user_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    roles: Option<RoleSet>,
    context: Option<AccountContext>,
    mode: Option<&'static str>,
    can_switch_to: Vec<RoleTag>,
    token_stale: Option<bool>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut nav = NavModel::new(ctx.tab.clone());
    let response = match nav.refresh().await {
        NavState::Anonymous => WhoamiResponse {
            signed_in: false,
            user_id: None,
            email: None,
            name: None,
            roles: None,
            context: None,
            mode: None,
            can_switch_to: Vec::new(),
            token_stale: None,
        },
        NavState::SignedIn {
            identity,
            context,
            switchable,
        } => {
            let max_age = TimeDelta::seconds(
                i64::try_from(ctx.config.session.max_token_age_secs).unwrap_or(i64::MAX),
            );
            let token_stale = ctx
                .tab
                .store
                .token_stamp()
                .map(|stamp| session::is_stale(&stamp, max_age, Utc::now()));
            WhoamiResponse {
                signed_in: true,
                user_id: Some(identity.id.clone()),
                email: Some(identity.email.clone()),
                name: Some(identity.name.clone()),
                roles: Some(identity.roles.clone()),
                context: Some(*context),
                mode: Some(context.mode_name()),
                can_switch_to: switchable.clone(),
                token_stale,
            }
        }
    };
    output(&response, flags.format)
}
