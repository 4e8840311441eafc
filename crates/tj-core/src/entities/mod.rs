//! Records exchanged with the backend and persisted in client storage.

mod identity;
mod job;
mod message;
mod session;

pub use identity::{Identity, IdentitySnapshot};
pub use job::{Job, JobSummary, Quote};
pub use message::MessageRow;
pub use session::{Session, TokenStamp};
