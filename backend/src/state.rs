//! Service graph shared by the server and the integration tests

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use vehicle_storage::{
    login_credential::LoginCredentialStorage, table::TableProvisioner,
    vehicle_image::VehicleImageStorage,
};

use crate::{
    gallery::Gallery,
    image_bucket::ImageBucket,
    provisioning::{DemoImage, Provisioner},
    types::Environment,
};

const DEMO_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Names of the cloud resources the gallery uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    /// S3 bucket holding the images
    pub bucket: String,
    /// `DynamoDB` table with one record per image
    pub images_table: String,
    /// `DynamoDB` table with login credentials
    pub credentials_table: String,
}

impl ResourceNames {
    /// Resource names configured for the environment
    #[must_use]
    pub fn from_environment(environment: &Environment) -> Self {
        Self {
            bucket: environment.s3_bucket(),
            images_table: environment.images_table(),
            credentials_table: environment.credentials_table(),
        }
    }
}

/// Every long-lived service, each behind an `Arc` for the `Extension` layers
pub struct AppServices {
    /// Image bucket client
    pub bucket: Arc<ImageBucket>,
    /// Image metadata storage
    pub images: Arc<VehicleImageStorage>,
    /// Login credential storage
    pub credentials: Arc<LoginCredentialStorage>,
    /// Resource provisioning and seeding
    pub provisioner: Arc<Provisioner>,
    /// Gallery service
    pub gallery: Arc<Gallery>,
}

impl AppServices {
    /// Builds AWS clients from the environment and wires every service
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the demo image cannot be built
    pub async fn from_environment(environment: &Environment) -> anyhow::Result<Self> {
        let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
        let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));

        Self::new(
            s3_client,
            dynamodb_client,
            ResourceNames::from_environment(environment),
            DemoImage {
                url: environment.demo_image_url(),
                name: environment.demo_image_name(),
            },
            environment.presigned_url_expiry_secs(),
        )
    }

    /// Wires every service from pre-built clients
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the demo image cannot be built
    pub fn new(
        s3_client: Arc<S3Client>,
        dynamodb_client: Arc<DynamoDbClient>,
        names: ResourceNames,
        demo_image: DemoImage,
        presigned_url_expiry_secs: u64,
    ) -> anyhow::Result<Self> {
        let bucket = Arc::new(ImageBucket::new(
            s3_client,
            names.bucket,
            presigned_url_expiry_secs,
        ));
        let images = Arc::new(VehicleImageStorage::new(
            dynamodb_client.clone(),
            names.images_table,
        ));
        let credentials = Arc::new(LoginCredentialStorage::new(
            dynamodb_client.clone(),
            names.credentials_table,
        ));

        let http_client = reqwest::Client::builder()
            .timeout(DEMO_DOWNLOAD_TIMEOUT)
            .build()?;

        let provisioner = Arc::new(Provisioner::new(
            bucket.clone(),
            TableProvisioner::new(dynamodb_client),
            images.clone(),
            credentials.clone(),
            http_client,
            demo_image,
        ));
        let gallery = Arc::new(Gallery::new(
            provisioner.clone(),
            bucket.clone(),
            images.clone(),
        ));

        Ok(Self {
            bucket,
            images,
            credentials,
            provisioner,
            gallery,
        })
    }
}
