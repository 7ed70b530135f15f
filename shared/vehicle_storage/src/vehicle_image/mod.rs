//! Vehicle image metadata storage
//!
//! Every object uploaded to the gallery bucket has exactly one record in
//! this table, keyed by the object key.

mod error;

use std::collections::HashMap;
use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
pub use error::{VehicleImageStorageError, VehicleImageStorageResult};
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_items, to_item};
use strum::Display;

use crate::table::TableSpec;

/// Metadata record for an uploaded vehicle image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleImage {
    /// Primary key - object key in the gallery bucket
    pub object_key: String,
    /// File name as supplied by the uploader
    pub original_name: String,
    /// MIME type of the object
    pub content_type: String,
    /// Object size in bytes
    pub size_bytes: i64,
    /// Username (or `system`) that uploaded the image
    pub uploaded_by: String,
    /// URL the image was fetched from, for server-side seeded images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Upload timestamp in unix seconds
    pub uploaded_at: i64,
}

/// `DynamoDB` attribute names for the vehicle image table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum VehicleImageAttribute {
    /// Primary key
    ObjectKey,
    /// Original file name
    OriginalName,
    /// MIME type
    ContentType,
    /// Size in bytes
    SizeBytes,
    /// Uploader
    UploadedBy,
    /// Source URL of seeded images
    SourceUrl,
    /// Upload timestamp
    UploadedAt,
}

/// Storage client for vehicle image metadata
pub struct VehicleImageStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl VehicleImageStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for image metadata
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    /// Fixed schema of the image metadata table
    #[must_use]
    pub fn table_spec(table_name: &str) -> TableSpec {
        TableSpec::new(table_name, VehicleImageAttribute::ObjectKey.to_string())
    }

    /// Name of the backing table
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Inserts or replaces the metadata record of an object
    ///
    /// # Errors
    ///
    /// Returns `VehicleImageStorageError` if serialization or the put operation fails
    pub async fn upsert(&self, image: &VehicleImage) -> VehicleImageStorageResult<()> {
        let item = to_item(image)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await?;

        Ok(())
    }

    /// Gets the metadata record of an object
    ///
    /// # Errors
    ///
    /// Returns `VehicleImageStorageError` if the get operation fails
    pub async fn get(&self, object_key: &str) -> VehicleImageStorageResult<Option<VehicleImage>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                VehicleImageAttribute::ObjectKey.to_string(),
                AttributeValue::S(object_key.to_string()),
            )
            .send()
            .await?;

        response
            .item
            .map(|item| serde_dynamo::from_item::<_, VehicleImage>(item))
            .transpose()
            .map_err(VehicleImageStorageError::from)
    }

    /// Lists every metadata record, newest first
    ///
    /// # Errors
    ///
    /// Returns `VehicleImageStorageError` if a scan page fails or a record cannot be parsed
    pub async fn list(&self) -> VehicleImageStorageResult<Vec<VehicleImage>> {
        self.scan(None).await
    }

    /// Finds the records fetched from the given source URL
    ///
    /// # Errors
    ///
    /// Returns `VehicleImageStorageError` if a scan page fails or a record cannot be parsed
    pub async fn find_by_source_url(
        &self,
        source_url: &str,
    ) -> VehicleImageStorageResult<Vec<VehicleImage>> {
        self.scan(Some(source_url)).await
    }

    async fn scan(&self, source_url: Option<&str>) -> VehicleImageStorageResult<Vec<VehicleImage>> {
        let mut images = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take());

            if let Some(url) = source_url {
                request = request
                    .filter_expression("#source_url = :source_url")
                    .expression_attribute_names(
                        "#source_url",
                        VehicleImageAttribute::SourceUrl.to_string(),
                    )
                    .expression_attribute_values(":source_url", AttributeValue::S(url.to_string()));
            }

            let response = request.send().await?;
            images.extend(from_items::<_, VehicleImage>(
                response.items.unwrap_or_default(),
            )?);

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        images.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.object_key.cmp(&b.object_key))
        });
        Ok(images)
    }

    /// Deletes the metadata record of an object
    ///
    /// # Errors
    ///
    /// Returns `VehicleImageStorageError` if the delete operation fails
    pub async fn delete(&self, object_key: &str) -> VehicleImageStorageResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                VehicleImageAttribute::ObjectKey.to_string(),
                AttributeValue::S(object_key.to_string()),
            )
            .send()
            .await?;

        Ok(())
    }
}
