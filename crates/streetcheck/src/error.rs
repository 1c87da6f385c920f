use crate::config::ConfigError;
use crate::directory::DirectoryImportError;
use crate::dispatch::RoutingError;
use crate::intake::router::intake_status;
use crate::intake::{IntakeError, ProviderError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Directory(DirectoryImportError),
    Routing(RoutingError),
    Provider(ProviderError),
    Intake(IntakeError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Directory(err) => write!(f, "organisation directory error: {}", err),
            AppError::Routing(err) => write!(f, "routing error: {}", err),
            AppError::Provider(err) => write!(f, "collaborator error: {}", err),
            AppError::Intake(err) => write!(f, "intake error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Directory(err) => Some(err),
            AppError::Routing(err) => Some(err),
            AppError::Provider(err) => Some(err),
            AppError::Intake(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Routing(_) | AppError::Directory(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Intake(ref err) => intake_status(err),
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DirectoryImportError> for AppError {
    fn from(value: DirectoryImportError) -> Self {
        Self::Directory(value)
    }
}

impl From<RoutingError> for AppError {
    fn from(value: RoutingError) -> Self {
        Self::Routing(value)
    }
}

impl From<ProviderError> for AppError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

impl From<IntakeError> for AppError {
    fn from(value: IntakeError) -> Self {
        Self::Intake(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Intake(IntakeError::Repository(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::CoordinateError;

    #[test]
    fn routing_errors_are_client_errors() {
        let err = AppError::from(RoutingError::InvalidObservation {
            field: "wind_speed_mps",
            value: f64::NAN,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_errors_are_gateway_errors() {
        let err = AppError::from(ProviderError::NoResults {
            provider: "google-geocoding",
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn display_names_the_failing_layer() {
        let err = AppError::from(RoutingError::from(CoordinateError::LatitudeOutOfRange(91.0)));
        assert!(err.to_string().starts_with("routing error: invalid coordinates"));
    }

    #[test]
    fn intake_errors_keep_their_http_status() {
        let missing = AppError::from(RepositoryError::NotFound);
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let bad_request = AppError::from(IntakeError::InvalidRequest("outcome is required".into()));
        assert_eq!(bad_request.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
