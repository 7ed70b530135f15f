//! Error types for table provisioning

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    create_table::CreateTableError, delete_table::DeleteTableError,
    describe_table::DescribeTableError,
};
use thiserror::Error;

/// Result type alias for table provisioning
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while creating, inspecting or dropping a table
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to describe a `DynamoDB` table
    #[error("Failed to describe DynamoDB table: {0}")]
    DynamoDbDescribeError(#[from] SdkError<DescribeTableError>),

    /// Failed to create a `DynamoDB` table
    #[error("Failed to create DynamoDB table: {0}")]
    DynamoDbCreateError(#[from] SdkError<CreateTableError>),

    /// Failed to delete a `DynamoDB` table
    #[error("Failed to delete DynamoDB table: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteTableError>),

    /// The key schema could not be built
    #[error("Invalid table schema: {0}")]
    InvalidSchema(String),

    /// The table did not become active in time
    #[error("Table {0} did not become active")]
    NotActive(String),

    /// The table was still being deleted when recreation was attempted
    #[error("Table {0} is still being deleted")]
    StillDeleting(String),
}
