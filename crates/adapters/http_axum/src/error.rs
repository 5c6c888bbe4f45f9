//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use gardenhub_domain::error::GardenHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`GardenHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(GardenHubError);

impl From<GardenHubError> for ApiError {
    fn from(err: GardenHubError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GardenHubError::Validation(_) | GardenHubError::MalformedInput(_) => {
                StatusCode::BAD_REQUEST
            }
            GardenHubError::NotFound(_) => StatusCode::NOT_FOUND,
            GardenHubError::Transport(_) => StatusCode::BAD_GATEWAY,
            GardenHubError::Serialization(_) | GardenHubError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            GardenHubError::Validation(err) => err.to_string(),
            GardenHubError::NotFound(err) => err.to_string(),
            GardenHubError::MalformedInput(err) => err.to_string(),
            GardenHubError::Transport(err) => {
                tracing::warn!(error = %err, "transport error");
                "upstream service unavailable".to_string()
            }
            GardenHubError::Serialization(err) => {
                tracing::error!(error = %err, "serialization error");
                "internal server error".to_string()
            }
            GardenHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardenhub_domain::error::{NotFoundError, ValidationError};

    #[test]
    fn should_map_domain_errors_to_status_codes() {
        let cases = [
            (
                GardenHubError::from(ValidationError::EmptyAction),
                StatusCode::BAD_REQUEST,
            ),
            (
                GardenHubError::from(NotFoundError {
                    entity: "Device",
                    id: "g1".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                GardenHubError::transport(std::io::Error::other("broker down")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GardenHubError::Storage(Box::new(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
