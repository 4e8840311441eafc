mod inbox;
mod jobs;

pub use inbox::{InboxCommands, InboxReadArgs};
pub use jobs::{
    JobIdArgs, JobsBrowseArgs, JobsCommands, JobsMineArgs, JobsPostArgs, JobsQuoteArgs, QuoteIdArgs,
};
