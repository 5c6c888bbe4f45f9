//! Advisor adapter error types.

use gardenhub_domain::error::GardenHubError;

/// Errors from talking to the decision service.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// The request could not be sent or the body could not be read.
    #[error("advisor request failed")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("advisor answered {status}: {body}")]
    Status { status: u16, body: String },

    /// `response_type` was neither `TEXT` nor `TOOL_CALL`.
    #[error("unknown advisor response type {0:?}")]
    UnknownResponseType(String),

    /// A `TOOL_CALL` answer without a `tool_call` object.
    #[error("advisor response of type TOOL_CALL has no tool_call")]
    MissingToolCall,
}

impl AdvisorError {
    /// Convert into a [`GardenHubError::Transport`]: every advisor failure is
    /// an external call failure from the job's point of view.
    pub fn into_domain(self) -> GardenHubError {
        GardenHubError::transport(self)
    }
}

impl From<AdvisorError> for GardenHubError {
    fn from(err: AdvisorError) -> Self {
        err.into_domain()
    }
}
