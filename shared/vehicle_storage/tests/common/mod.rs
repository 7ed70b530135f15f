// Not every helper is used in every test binary
#![allow(dead_code)]

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use uuid::Uuid;
use vehicle_storage::table::{TableProvisioner, TableSpec};

/// Test configuration for LocalStack
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "us-east-1";

/// Creates a `DynamoDB` client pointed at LocalStack
pub async fn localstack_client() -> Arc<DynamoDbClient> {
    let credentials = Credentials::from_keys(
        "test", // AWS_ACCESS_KEY_ID
        "test", // AWS_SECRET_ACCESS_KEY
        None,   // no session token
    );
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(credentials)
        .load()
        .await;

    Arc::new(DynamoDbClient::new(&config))
}

/// Unique table name so tests can run in parallel
pub fn unique_table_name(prefix: &str) -> String {
    format!("test-{prefix}-{}", Uuid::new_v4())
}

/// Owns a provisioned test table and drops it when the test ends
pub struct TestTable {
    pub dynamodb_client: Arc<DynamoDbClient>,
    pub table_name: String,
}

impl TestTable {
    /// Creates the table described by `spec_for(name)` with a unique name
    pub async fn new(prefix: &str, spec_for: impl Fn(&str) -> TableSpec) -> Self {
        let dynamodb_client = localstack_client().await;
        let table_name = unique_table_name(prefix);

        TableProvisioner::new(dynamodb_client.clone())
            .ensure_table(&spec_for(&table_name))
            .await
            .expect("Failed to create test table");

        Self {
            dynamodb_client,
            table_name,
        }
    }
}

impl Drop for TestTable {
    fn drop(&mut self) {
        let client = self.dynamodb_client.clone();
        let table = self.table_name.clone();

        // Use tokio runtime to delete table
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = client.delete_table().table_name(&table).send().await;
            });
        }
    }
}
