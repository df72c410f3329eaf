//! Centralized error types for the Apartment core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::wemo::client::IdentityError;
use crate::wemo::discovery::DiscoveryError;
use crate::wemo::retry::RetryError;
use crate::wemo::soap::SoapError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for logs and API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::SocketBind(_) => "socket_bind_failed",
            Self::NoInterfaces => "no_network_interfaces",
            Self::SearchFailed { .. } => "ssdp_search_failed",
        }
    }
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault(_) => "soap_fault",
            Self::Decode(_) => "soap_decode_error",
        }
    }
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_) => "http_error_status",
            Self::MissingFriendlyName(_) => "missing_friendly_name",
        }
    }
}

impl ErrorCode for RetryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Exhausted { .. } => "retry_exhausted",
            Self::Permanent(e) => e.code(),
        }
    }
}

/// Application-wide error type for the Apartment server.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApartmentError {
    /// No device is registered under the requested name.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A device kept failing until the backoff budget ran out.
    #[error("Device unavailable: {0}")]
    RetryExhausted(String),

    /// A device answered with something that is not a valid response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device discovery failed (SSDP/network issues).
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Client sent an invalid or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Invalid or unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApartmentError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DeviceNotFound(_) => "device_not_found",
            Self::RetryExhausted(_) => "retry_exhausted",
            Self::Protocol(_) => "protocol_error",
            Self::Discovery(_) => "discovery_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RetryExhausted(_) | Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Protocol(_) => StatusCode::BAD_GATEWAY,
            Self::Discovery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

// Re-export Result type aliases from their defining modules
pub use crate::wemo::client::IdentityResult;
pub use crate::wemo::discovery::DiscoveryResult;
pub use crate::wemo::retry::RetryResult;
pub use crate::wemo::soap::SoapResult;

/// Convenient Result alias for application-wide operations.
pub type ApartmentResult<T> = Result<T, ApartmentError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for ApartmentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SoapError> for ApartmentError {
    fn from(err: SoapError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<RetryError> for ApartmentError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Exhausted { .. } => Self::RetryExhausted(err.to_string()),
            RetryError::Permanent(e) => Self::Protocol(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApartmentError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<DiscoveryError> for ApartmentError {
    fn from(err: DiscoveryError) -> Self {
        Self::Discovery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApartmentError::DeviceNotFound("doesnotexist".into());
        assert_eq!(err.code(), "device_not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn exhausted_retry_maps_to_503() {
        let err: ApartmentError = RetryError::Exhausted {
            attempts: 4,
            elapsed: Duration::from_secs(30),
            last: SoapError::HttpStatus(500, "busy".into()),
        }
        .into();
        assert_eq!(err.code(), "retry_exhausted");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn permanent_retry_failure_maps_to_protocol_error() {
        let retry = RetryError::Permanent(SoapError::Decode("8".into()));
        assert_eq!(retry.code(), "soap_decode_error");

        let err: ApartmentError = retry.into();
        assert_eq!(err.code(), "protocol_error");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn discovery_error_maps_to_500() {
        let err: ApartmentError = DiscoveryError::NoInterfaces.into();
        assert_eq!(err.code(), "discovery_failed");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
