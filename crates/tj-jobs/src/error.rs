use thiserror::Error;
use tj_baas::BaasError;
use tj_core::{JobStatus, Notice, QuoteStatus, RoleTag};

#[derive(Debug, Error)]
pub enum JobsError {
    /// Form input failed validation; the message is user-facing.
    #[error("{0}")]
    Validation(String),

    #[error("Job not found.")]
    JobNotFound { job_id: String },

    #[error("Quote not found.")]
    QuoteNotFound { quote_id: String },

    #[error("Only the requester who posted this job can manage it.")]
    NotOwner { job_id: String },

    #[error("This job is not assigned to you.")]
    NotAssigned { job_id: String },

    #[error("Cannot move a job from {from} to {to}.")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("This job is no longer accepting quotes.")]
    QuotesClosed { job_id: String },

    #[error("This quote has already been {status}.")]
    QuoteNotPending { status: QuoteStatus },

    #[error("You need a {role} account to do this.")]
    RoleRequired { role: RoleTag },

    #[error(transparent)]
    Backend(#[from] BaasError),
}

impl JobsError {
    /// Text safe to show the viewer. Transport failures never leak through.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(error) if error.is_transport() => {
                "The service is temporarily unavailable. Please try again.".into()
            }
            Self::Backend(error) => error.service_message(),
            other => other.to_string(),
        }
    }

    /// Destructive notice with `title` and [`user_message`](Self::user_message).
    #[must_use]
    pub fn to_notice(&self, title: &str) -> Notice {
        Notice::failure(title, self.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_masked() {
        let err = JobsError::from(BaasError::Unavailable("connect: refused".into()));
        assert_eq!(
            err.user_message(),
            "The service is temporarily unavailable. Please try again."
        );
    }

    #[test]
    fn rejections_show_the_service_message() {
        let err = JobsError::from(BaasError::Rejected {
            status: 409,
            message: "duplicate key".into(),
        });
        let notice = err.to_notice("Error");
        assert!(notice.is_error());
        assert_eq!(notice.description, "duplicate key");
    }

    #[test]
    fn transition_names_both_states() {
        let err = JobsError::InvalidTransition {
            from: JobStatus::Completed,
            to: JobStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Cannot move a job from completed to cancelled.");
    }
}
