//! Cloud resource lifecycle: create what is missing, tear everything down,
//! and seed the demo image and login.

use std::sync::Arc;

use chrono::Utc;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use vehicle_storage::{
    login_credential::{LoginCredentialStorage, LoginCredentialStorageError},
    table::{TableError, TableProvisioner},
    vehicle_image::{VehicleImage, VehicleImageStorage, VehicleImageStorageError},
};

use crate::{
    image_bucket::{BucketError, ImageBucket},
    object_key,
};

/// Uploader recorded for images the server seeds itself
pub const SYSTEM_UPLOADER: &str = "system";

/// Result type for provisioning operations
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Errors that can occur while provisioning or seeding resources
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Bucket operation failed
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// Table operation failed
    #[error(transparent)]
    Table(#[from] TableError),

    /// Image metadata operation failed
    #[error(transparent)]
    Metadata(#[from] VehicleImageStorageError),

    /// Login credential operation failed
    #[error(transparent)]
    Credentials(#[from] LoginCredentialStorageError),

    /// The demo image could not be fetched
    #[error("Failed to download demo image: {0}")]
    Download(#[from] reqwest::Error),
}

/// Image fetched over HTTP and stored in the gallery on first load
#[derive(Debug, Clone)]
pub struct DemoImage {
    /// Where the image is downloaded from
    pub url: String,
    /// File name recorded in its metadata
    pub name: String,
}

/// Which resources [`Provisioner::ensure_all`] had to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsureReport {
    /// The bucket was created
    pub bucket_created: bool,
    /// The image metadata table was created
    pub images_table_created: bool,
    /// The login credential table was created
    pub credentials_table_created: bool,
}

/// Creates, recreates and seeds the gallery's bucket and tables
pub struct Provisioner {
    bucket: Arc<ImageBucket>,
    tables: TableProvisioner,
    images: Arc<VehicleImageStorage>,
    credentials: Arc<LoginCredentialStorage>,
    http_client: reqwest::Client,
    demo_image: DemoImage,
    /// Held from the "already seeded" check until the record is written
    seed_lock: Mutex<()>,
}

impl Provisioner {
    /// Creates a new provisioner
    #[must_use]
    pub fn new(
        bucket: Arc<ImageBucket>,
        tables: TableProvisioner,
        images: Arc<VehicleImageStorage>,
        credentials: Arc<LoginCredentialStorage>,
        http_client: reqwest::Client,
        demo_image: DemoImage,
    ) -> Self {
        Self {
            bucket,
            tables,
            images,
            credentials,
            http_client,
            demo_image,
            seed_lock: Mutex::new(()),
        }
    }

    /// Makes sure the bucket and both tables exist
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError` for the first resource that cannot be checked or created
    pub async fn ensure_all(&self) -> ProvisioningResult<EnsureReport> {
        let report = EnsureReport {
            bucket_created: self.bucket.ensure_bucket().await?,
            images_table_created: self
                .tables
                .ensure_table(&VehicleImageStorage::table_spec(self.images.table_name()))
                .await?,
            credentials_table_created: self
                .tables
                .ensure_table(&LoginCredentialStorage::table_spec(
                    self.credentials.table_name(),
                ))
                .await?,
        };

        if report != EnsureReport::default() {
            info!(?report, "provisioned missing resources");
        }
        Ok(report)
    }

    /// Deletes the bucket (with its contents) and both tables
    ///
    /// Every step is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first `ProvisioningError` encountered
    #[instrument(skip(self))]
    pub async fn teardown(&self) -> ProvisioningResult<()> {
        let mut first_error: Option<ProvisioningError> = None;

        if let Err(err) = self.bucket.delete_bucket().await {
            error!("Failed to delete bucket {}: {err}", self.bucket.bucket_name());
            first_error = Some(err.into());
        }

        for table in [self.images.table_name(), self.credentials.table_name()] {
            if let Err(err) = self.tables.drop_table(table).await {
                error!("Failed to delete table {table}: {err}");
                if first_error.is_none() {
                    first_error = Some(err.into());
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Tears every resource down and creates it again
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError` if teardown or recreation fails
    pub async fn reset(&self) -> ProvisioningResult<EnsureReport> {
        info!("resetting gallery resources");
        self.teardown().await?;
        self.ensure_all().await
    }

    /// Downloads the demo image and stores it with its metadata record
    ///
    /// Returns the new record, or `None` if the demo image was already seeded
    /// or the download answered with a non-200 status. Concurrent calls on one
    /// provisioner run one at a time, so the image is stored at most once.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError` if the request, upload or metadata write fails
    #[instrument(skip(self), fields(url = %self.demo_image.url))]
    pub async fn seed_demo_image(&self) -> ProvisioningResult<Option<VehicleImage>> {
        let _seeding = self.seed_lock.lock().await;

        if !self
            .images
            .find_by_source_url(&self.demo_image.url)
            .await?
            .is_empty()
        {
            debug!("demo image already seeded");
            return Ok(None);
        }

        let response = self.http_client.get(&self.demo_image.url).send().await?;
        if response.status() != StatusCode::OK {
            warn!(
                status = %response.status(),
                "Failed to download the demo image"
            );
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .map_or_else(
                || object_key::content_type_for(&self.demo_image.name),
                ToString::to_string,
            );
        let body = response.bytes().await?.to_vec();

        let now = Utc::now();
        let key = object_key::generate(&self.demo_image.name, now);
        let record = VehicleImage {
            object_key: key.clone(),
            original_name: self.demo_image.name.clone(),
            content_type: content_type.clone(),
            size_bytes: i64::try_from(body.len()).unwrap_or(i64::MAX),
            uploaded_by: SYSTEM_UPLOADER.to_string(),
            source_url: Some(self.demo_image.url.clone()),
            uploaded_at: now.timestamp(),
        };

        self.bucket.put_object(&key, body, &content_type).await?;
        self.images.upsert(&record).await?;

        info!(object_key = %key, "seeded demo image");
        Ok(Some(record))
    }

    /// Creates a login credential unless the username already exists
    ///
    /// Returns `true` if the credential was created.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::Credentials` for failures other than a taken username
    pub async fn seed_login(&self, username: &str, password: &str) -> ProvisioningResult<bool> {
        match self.credentials.create(username, password).await {
            Ok(_) => {
                info!(username, "seeded login credential");
                Ok(true)
            }
            Err(LoginCredentialStorageError::UsernameTaken) => {
                debug!(username, "seed login already present");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
