use thiserror::Error;
use tj_baas::BaasError;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("failed to load notifications: {0}")]
    Load(#[source] BaasError),

    #[error("failed to mark messages read on job {job_id}: {source}")]
    MarkRead {
        job_id: String,
        #[source]
        source: BaasError,
    },
}
