//! Table provisioning for `DynamoDB`
//!
//! Every table used by the gallery has the same shape: a single string
//! partition key and on-demand billing. [`TableProvisioner::ensure_table`]
//! is safe to call on every request; it only creates what is missing.

mod error;

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::operation::{
    create_table::CreateTableError, delete_table::DeleteTableError,
    describe_table::DescribeTableError,
};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
pub use error::{TableError, TableResult};
use tracing::{debug, info};

/// How many times `describe_table` is polled while waiting for a status change
const POLL_ATTEMPTS: u32 = 100;
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Fixed schema of a gallery table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name
    pub name: String,
    /// Name of the string partition key attribute
    pub partition_key: String,
}

impl TableSpec {
    /// Creates a table spec with a string partition key
    #[must_use]
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
        }
    }
}

/// Creates and drops gallery tables
pub struct TableProvisioner {
    dynamodb_client: Arc<DynamoDbClient>,
}

impl TableProvisioner {
    /// Creates a new provisioner
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>) -> Self {
        Self { dynamodb_client }
    }

    /// Returns the status of a table, or `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `TableError::DynamoDbDescribeError` for any failure other than a missing table
    pub async fn table_status(&self, table_name: &str) -> TableResult<Option<TableStatus>> {
        match self
            .dynamodb_client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .table()
                .and_then(|table| table.table_status())
                .cloned()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DescribeTableError::is_resource_not_found_exception) =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Makes sure the table exists, creating it with the fixed schema if absent
    ///
    /// Returns `true` if the table was created by this call.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if the table cannot be described or created, or
    /// if a freshly created table never becomes active
    pub async fn ensure_table(&self, spec: &TableSpec) -> TableResult<bool> {
        match self.table_status(&spec.name).await? {
            Some(TableStatus::Deleting) => {
                debug!(table = %spec.name, "table is being deleted, waiting before recreating");
                self.wait_until_deleted(&spec.name).await?;
            }
            Some(status) => {
                debug!(table = %spec.name, status = status.as_str(), "table already exists");
                if status != TableStatus::Active {
                    self.wait_until_active(&spec.name).await?;
                }
                return Ok(false);
            }
            None => {}
        }

        let created = self.create_table(spec).await?;
        self.wait_until_active(&spec.name).await?;

        if created {
            info!(table = %spec.name, "created DynamoDB table");
        }
        Ok(created)
    }

    async fn create_table(&self, spec: &TableSpec) -> TableResult<bool> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(&spec.partition_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| TableError::InvalidSchema(e.to_string()))?;
        let key = KeySchemaElement::builder()
            .attribute_name(&spec.partition_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| TableError::InvalidSchema(e.to_string()))?;

        let result = self
            .dynamodb_client
            .create_table()
            .table_name(&spec.name)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(attribute)
            .key_schema(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            // Someone else created it between describe and create
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateTableError::is_resource_in_use_exception) =>
            {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn wait_until_active(&self, table_name: &str) -> TableResult<()> {
        for _ in 0..POLL_ATTEMPTS {
            if self.table_status(table_name).await? == Some(TableStatus::Active) {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Err(TableError::NotActive(table_name.to_string()))
    }

    async fn wait_until_deleted(&self, table_name: &str) -> TableResult<()> {
        for _ in 0..POLL_ATTEMPTS {
            if self.table_status(table_name).await?.is_none() {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Err(TableError::StillDeleting(table_name.to_string()))
    }

    /// Deletes a table; a missing table is not an error
    ///
    /// Returns `true` if a table was deleted.
    ///
    /// # Errors
    ///
    /// Returns `TableError::DynamoDbDeleteError` if the delete fails
    pub async fn drop_table(&self, table_name: &str) -> TableResult<bool> {
        match self
            .dynamodb_client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(_) => {
                info!(table = %table_name, "deleted DynamoDB table");
                Ok(true)
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DeleteTableError::is_resource_not_found_exception) =>
            {
                debug!(table = %table_name, "table already absent");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_spec_new() {
        let spec = TableSpec::new("approved-car-images", "object_key");
        assert_eq!(spec.name, "approved-car-images");
        assert_eq!(spec.partition_key, "object_key");
    }
}
