mod common;

use aws_sdk_dynamodb::types::TableStatus;
use common::{localstack_client, unique_table_name};
use vehicle_storage::table::{TableProvisioner, TableSpec};

#[tokio::test]
async fn test_ensure_table_creates_missing_table() {
    let client = localstack_client().await;
    let provisioner = TableProvisioner::new(client);
    let spec = TableSpec::new(unique_table_name("provision"), "object_key");

    assert_eq!(provisioner.table_status(&spec.name).await.unwrap(), None);

    let created = provisioner.ensure_table(&spec).await.unwrap();
    assert!(created);
    assert_eq!(
        provisioner.table_status(&spec.name).await.unwrap(),
        Some(TableStatus::Active)
    );

    provisioner.drop_table(&spec.name).await.unwrap();
}

#[tokio::test]
async fn test_ensure_table_is_idempotent() {
    let client = localstack_client().await;
    let provisioner = TableProvisioner::new(client);
    let spec = TableSpec::new(unique_table_name("idempotent"), "username");

    assert!(provisioner.ensure_table(&spec).await.unwrap());
    assert!(!provisioner.ensure_table(&spec).await.unwrap());
    assert!(!provisioner.ensure_table(&spec).await.unwrap());

    provisioner.drop_table(&spec.name).await.unwrap();
}

#[tokio::test]
async fn test_drop_missing_table_is_not_an_error() {
    let client = localstack_client().await;
    let provisioner = TableProvisioner::new(client);
    let name = unique_table_name("missing");

    let dropped = provisioner.drop_table(&name).await.unwrap();
    assert!(!dropped);
}

#[tokio::test]
async fn test_ensure_right_after_drop_ends_active() {
    let client = localstack_client().await;
    let provisioner = TableProvisioner::new(client);
    let spec = TableSpec::new(unique_table_name("recreate"), "object_key");

    provisioner.ensure_table(&spec).await.unwrap();
    assert!(provisioner.drop_table(&spec.name).await.unwrap());

    // The table may still be DELETING here; ensure_table waits it out
    assert!(provisioner.ensure_table(&spec).await.unwrap());
    assert_eq!(
        provisioner.table_status(&spec.name).await.unwrap(),
        Some(TableStatus::Active)
    );

    provisioner.drop_table(&spec.name).await.unwrap();
}
