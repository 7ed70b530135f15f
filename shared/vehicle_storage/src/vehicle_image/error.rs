//! Error types for vehicle image metadata storage

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError, scan::ScanError,
};
use thiserror::Error;

/// Result type alias for vehicle image storage operations
pub type VehicleImageStorageResult<T> = Result<T, VehicleImageStorageError>;

/// Storage error types for vehicle image metadata
#[derive(Debug, Error)]
pub enum VehicleImageStorageError {
    /// Failed to put image metadata into `DynamoDB`
    #[error("Failed to put vehicle image into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get image metadata from `DynamoDB`
    #[error("Failed to get vehicle image from DynamoDB: {0}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to scan image metadata from `DynamoDB`
    #[error("Failed to scan vehicle images from DynamoDB: {0}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to delete image metadata from `DynamoDB`
    #[error("Failed to delete vehicle image from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// Failed to convert a record to or from a `DynamoDB` item
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for VehicleImageStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
