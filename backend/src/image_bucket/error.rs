//! Error types for bucket operations

use aws_sdk_s3::{config::http::HttpResponse, error::DisplayErrorContext, error::SdkError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// AWS SDK error (dispatch, timeout, construction)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
}

impl<E> From<SdkError<E, HttpResponse>> for BucketError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: SdkError<E, HttpResponse>) -> Self {
        let status = error.raw_response().map(|raw| raw.status().as_u16());
        let message = DisplayErrorContext(&error).to_string();

        match (&error, status) {
            (_, Some(status)) if status >= 500 => Self::UpstreamError(message),
            (SdkError::ServiceError(_), _) => Self::S3Error(message),
            _ => Self::AwsError(message),
        }
    }
}
