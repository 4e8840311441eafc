use clap::{Args, Subcommand};
use tj_core::RoleTag;

use super::subcommands::{InboxCommands, JobsCommands};

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create an account, or add a role to an existing one.
    Register(RegisterArgs),
    /// Sign out and clear local state.
    Logout,
    /// Show who is signed in and the active account context.
    Whoami,
    /// Switch the active account context.
    Switch(SwitchArgs),
    /// Check whether the signed-in user may open a role's dashboard.
    Guard(GuardArgs),
    /// Complete an email verification from the link in the email.
    Verify(VerifyArgs),
    /// Unread message notifications.
    Inbox {
        #[command(subcommand)]
        action: InboxCommands,
    },
    /// Post, browse and quote on jobs.
    Jobs {
        #[command(subcommand)]
        action: JobsCommands,
    },
    /// Update your name, phone or city.
    Profile(ProfileArgs),
}

#[derive(Clone, Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Sign in through this role's form.
    #[arg(long, value_parser = parse_role)]
    pub role: Option<RoleTag>,
}

#[derive(Clone, Debug, Args)]
pub struct RegisterArgs {
    /// Role to register as (requester, worker, affiliate).
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
    /// Defaults to the configured city.
    #[arg(long, default_value = "")]
    pub city: String,
}

#[derive(Clone, Debug, Args)]
pub struct SwitchArgs {
    #[arg(value_parser = parse_role)]
    pub role: RoleTag,
}

#[derive(Clone, Debug, Args)]
pub struct GuardArgs {
    /// Role the dashboard requires.
    #[arg(value_parser = parse_role)]
    pub role: RoleTag,
}

#[derive(Clone, Debug, Args)]
pub struct VerifyArgs {
    /// Full link from the verification email.
    pub url: String,
}

#[derive(Clone, Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
}

pub fn parse_role(value: &str) -> Result<RoleTag, String> {
    value.parse::<RoleTag>().map_err(|error| error.to_string())
}
