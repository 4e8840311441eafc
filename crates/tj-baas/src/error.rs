use thiserror::Error;

#[derive(Debug, Error)]
pub enum BaasError {
    /// The service could not be reached or answered with a server error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The auth service rejected the request (bad credentials, unconfirmed email, ...).
    #[error("auth rejected: {message}")]
    Auth { status: u16, message: String },

    /// The row store rejected the request.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// No authenticated session is available for a call that requires one.
    #[error("no active session")]
    NoSession,

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("token store error: {0}")]
    TokenStore(String),
}

impl BaasError {
    /// Message as reported by the service, without the variant prefix.
    #[must_use]
    pub fn service_message(&self) -> String {
        match self {
            Self::Auth { message, .. } | Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Transport-level failures, as opposed to a definite answer from the service.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Decode(_))
    }
}
