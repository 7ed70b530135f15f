//! Error types for login credential storage

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError,
};
use thiserror::Error;

/// Result type for login credential storage operations
pub type LoginCredentialStorageResult<T> = Result<T, LoginCredentialStorageError>;

/// Errors that can occur during login credential storage operations
#[derive(Error, Debug)]
pub enum LoginCredentialStorageError {
    /// Failed to insert credential into Dynamo DB
    #[error("Failed to insert login credential into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get credential from Dynamo DB
    #[error("Failed to get login credential from DynamoDB: {0}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to delete credential from Dynamo DB
    #[error("Failed to delete login credential from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// A credential with this username already exists
    #[error("Username already taken")]
    UsernameTaken,

    /// Password hashing or hash parsing failed
    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    /// The blocking task running Argon2 panicked or was cancelled
    #[error("Password task failed: {0}")]
    PasswordTaskError(#[from] tokio::task::JoinError),

    /// Serialization error for `serde_dynamo`
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for LoginCredentialStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
