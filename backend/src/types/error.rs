//! Universal error handling for the API

use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use vehicle_storage::{
    login_credential::LoginCredentialStorageError, table::TableError,
    vehicle_image::VehicleImageStorageError,
};

use crate::{
    gallery::GalleryError, image_bucket::BucketError, page::PageError,
    provisioning::ProvisioningError,
};

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: Cow<'static, str>,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code: Cow::Borrowed(code),
                    message: msg,
                },
            },
        }
    }

    /// 400 for a request body that failed validation, carrying the field's error code
    #[must_use]
    pub fn validation(code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            inner: ApiErrorResponse {
                allow_retry: false,
                error: ErrorBody {
                    code: code.into(),
                    message: "Request validation failed",
                },
            },
        }
    }

    /// Generic 500 used for storage failures the client cannot act on
    #[must_use]
    pub const fn internal(retry: bool) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            retry,
        )
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert bucket errors to application errors
impl From<BucketError> for AppError {
    fn from(err: BucketError) -> Self {
        match &err {
            BucketError::UpstreamError(msg) => {
                tracing::error!("S3 upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "S3 service temporarily unavailable",
                    true,
                )
            }
            BucketError::S3Error(msg) | BucketError::AwsError(msg) => {
                tracing::error!("S3/AWS error: {msg}");
                Self::internal(true)
            }
            BucketError::ConfigError(msg) => {
                tracing::error!("Configuration error: {msg}");
                Self::internal(false)
            }
        }
    }
}

impl From<TableError> for AppError {
    fn from(err: TableError) -> Self {
        tracing::error!("DynamoDB table error: {err}");
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "resource_unavailable",
            "Storage resources are not available",
            true,
        )
    }
}

impl From<VehicleImageStorageError> for AppError {
    fn from(err: VehicleImageStorageError) -> Self {
        tracing::error!("Vehicle image storage error: {err}");
        Self::internal(true)
    }
}

impl From<LoginCredentialStorageError> for AppError {
    fn from(err: LoginCredentialStorageError) -> Self {
        match err {
            LoginCredentialStorageError::UsernameTaken => Self::new(
                StatusCode::CONFLICT,
                "username_taken",
                "Username is already taken",
                false,
            ),
            err => {
                tracing::error!("Login credential storage error: {err}");
                Self::internal(true)
            }
        }
    }
}

impl From<ProvisioningError> for AppError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::Bucket(err) => err.into(),
            ProvisioningError::Table(err) => err.into(),
            ProvisioningError::Metadata(err) => err.into(),
            ProvisioningError::Credentials(err) => err.into(),
            ProvisioningError::Download(err) => {
                tracing::error!("Demo image download failed: {err}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "Demo image could not be fetched",
                    true,
                )
            }
        }
    }
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::Provisioning(err) => err.into(),
            GalleryError::Bucket(err) => err.into(),
            GalleryError::Metadata(err) => err.into(),
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        tracing::error!("Page rendering error: {err}");
        Self::internal(false)
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_taken_is_conflict() {
        let err = AppError::from(LoginCredentialStorageError::UsernameTaken);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "username_taken");
    }

    #[test]
    fn test_bucket_upstream_is_service_unavailable() {
        let err = AppError::from(BucketError::UpstreamError("503".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.inner.allow_retry);
    }

    #[test]
    fn test_bucket_config_error_is_not_retryable() {
        let err = AppError::from(BucketError::ConfigError("bad expiry".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.inner.allow_retry);
    }

    #[test]
    fn test_nested_gallery_error_keeps_mapping() {
        let err = AppError::from(GalleryError::Provisioning(ProvisioningError::Bucket(
            BucketError::UpstreamError("503".to_string()),
        )));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_error_carries_field_code() {
        let err = AppError::validation("invalid_username");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_username");
        assert!(!err.inner.allow_retry);
    }

    #[test]
    fn test_page_error_is_internal() {
        let err = AppError::from(PageError::Template("broken".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.inner.allow_retry);
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = AppError::new(StatusCode::UNAUTHORIZED, "invalid_credentials", "nope", false);
        let json = serde_json::to_value(&err.inner).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allowRetry": false,
                "error": { "code": "invalid_credentials", "message": "nope" }
            })
        );
    }
}
