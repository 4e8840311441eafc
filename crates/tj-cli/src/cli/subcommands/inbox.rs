use clap::{Args, Subcommand};

#[derive(Clone, Debug, Subcommand)]
pub enum InboxCommands {
    /// List jobs with unread messages.
    List,
    /// Print notifications as they arrive.
    Watch,
    /// Mark a job's messages read.
    Read(InboxReadArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InboxReadArgs {
    pub job_id: String,
}
