//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GardenHubError`] via `#[from]` (no `String` variants at the top level).

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum GardenHubError {
    /// A value violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A device, rule or record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An inbound address or payload could not be understood.
    #[error("malformed input")]
    MalformedInput(#[from] MalformedInputError),

    /// An outbound document could not be encoded.
    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),

    /// Publishing to the transport or calling an external service failed.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GardenHubError {
    /// Wrap any error as a [`GardenHubError::Transport`].
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// Whether this error is a transport (publish / external call) failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device id {0:?} contains a reserved transport character")]
    ReservedCharacter(String),

    #[error("command action must not be empty")]
    EmptyAction,

    #[error("unknown connectivity status {0:?}")]
    UnknownConnectivity(String),

    #[error("unknown pump state {0:?}")]
    UnknownPumpState(String),

    #[error("unknown control mode {0:?}")]
    UnknownControlMode(String),

    #[error("pump run time must be a whole number of seconds, got {0}")]
    InvalidPumpTime(String),

    #[error("chat message must not be empty")]
    EmptyMessage,

    #[error("field {field} is required for {action}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("minimum soil moisture must be within 0..=100, got {0}")]
    MoistureOutOfRange(f64),

    #[error("maximum pump duration must be greater than zero")]
    ZeroPumpDuration,
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Inbound input that was dropped.
#[derive(Debug, thiserror::Error)]
pub enum MalformedInputError {
    #[error("topic {topic:?} does not match <namespace>/device/<device_id>/<kind>")]
    Topic { topic: String },

    #[error("{kind} payload is not valid JSON")]
    Json {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} payload must be a JSON object")]
    NotAnObject { kind: &'static str },

    #[error("{kind} payload is missing the {field:?} object")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("unrecognised message kind {0:?}")]
    UnknownKind(String),
}
