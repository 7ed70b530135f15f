//! Gallery service: everything a page load or upload request does

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use vehicle_storage::vehicle_image::{VehicleImage, VehicleImageStorage, VehicleImageStorageError};

use crate::{
    image_bucket::{BucketError, ImageBucket, PresignedUrl},
    object_key,
    provisioning::{Provisioner, ProvisioningError},
};

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Errors that can occur while serving the gallery
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Resources could not be provisioned
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// Bucket operation failed
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// Image metadata operation failed
    #[error(transparent)]
    Metadata(#[from] VehicleImageStorageError),
}

/// One image shown in the gallery
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    /// Object key in the bucket
    pub object_key: String,
    /// Presigned GET URL of the image
    pub image_url: String,
    /// Object size in bytes
    pub size_bytes: i64,
    /// Last modification time reported by S3
    pub last_modified: Option<DateTime<Utc>>,
    /// Metadata record, if one exists for this object
    pub metadata: Option<VehicleImage>,
}

impl GalleryEntry {
    /// Upload time, falling back to the S3 modification time
    #[must_use]
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .as_ref()
            .and_then(|metadata| DateTime::from_timestamp(metadata.uploaded_at, 0))
            .or(self.last_modified)
    }
}

/// A new upload the client has to complete with a PUT
#[derive(Debug, Clone)]
pub struct UploadRegistration {
    /// File name supplied by the client
    pub filename: String,
    /// MIME type; guessed from the file name when absent
    pub content_type: Option<String>,
    /// Size in bytes
    pub content_length: i64,
    /// Username of the uploader
    pub uploaded_by: String,
}

/// Presigned upload target plus the metadata written for it
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// Metadata record stored for the object
    pub record: VehicleImage,
    /// Presigned PUT URL
    pub upload_url: PresignedUrl,
}

/// Gallery service shared by the page and API handlers
pub struct Gallery {
    provisioner: Arc<Provisioner>,
    bucket: Arc<ImageBucket>,
    images: Arc<VehicleImageStorage>,
}

impl Gallery {
    /// Creates the gallery service
    #[must_use]
    pub const fn new(
        provisioner: Arc<Provisioner>,
        bucket: Arc<ImageBucket>,
        images: Arc<VehicleImageStorage>,
    ) -> Self {
        Self {
            provisioner,
            bucket,
            images,
        }
    }

    /// Everything a page load does: provision, seed, list
    ///
    /// Seeding failures are logged and do not fail the page.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if resources cannot be provisioned or listed
    #[instrument(skip(self))]
    pub async fn load_page(&self) -> GalleryResult<Vec<GalleryEntry>> {
        self.provisioner.ensure_all().await?;

        if let Err(err) = self.provisioner.seed_demo_image().await {
            warn!("Demo image was not seeded: {err}");
        }

        self.list_entries().await
    }

    /// Lists bucket objects joined with their metadata, newest first
    ///
    /// Objects without a metadata record are still listed.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if the bucket or the metadata table cannot be read
    pub async fn list_entries(&self) -> GalleryResult<Vec<GalleryEntry>> {
        let objects = self.bucket.list_objects().await?;
        let mut metadata: HashMap<String, VehicleImage> = self
            .images
            .list()
            .await?
            .into_iter()
            .map(|image| (image.object_key.clone(), image))
            .collect();

        let mut entries = Vec::with_capacity(objects.len());
        for object in objects {
            let image_url = self.bucket.presigned_get_url(&object.key).await?.url;
            entries.push(GalleryEntry {
                metadata: metadata.remove(&object.key),
                object_key: object.key,
                image_url,
                size_bytes: object.size_bytes,
                last_modified: object.last_modified,
            });
        }

        if !metadata.is_empty() {
            debug!(
                count = metadata.len(),
                "metadata records without a stored object"
            );
        }

        entries.sort_by(|a, b| {
            b.uploaded_at()
                .cmp(&a.uploaded_at())
                .then_with(|| a.object_key.cmp(&b.object_key))
        });
        Ok(entries)
    }

    /// Reserves a unique key, records its metadata and presigns the upload
    ///
    /// # Errors
    ///
    /// Returns `GalleryError` if presigning or the metadata write fails
    #[instrument(skip(self))]
    pub async fn register_upload(
        &self,
        registration: UploadRegistration,
    ) -> GalleryResult<UploadTicket> {
        let now = Utc::now();
        let key = object_key::generate(&registration.filename, now);
        let content_type = registration
            .content_type
            .unwrap_or_else(|| object_key::content_type_for(&registration.filename));

        let upload_url = self
            .bucket
            .presigned_put_url(&key, &content_type, registration.content_length)
            .await?;

        let record = VehicleImage {
            object_key: key,
            original_name: registration.filename,
            content_type,
            size_bytes: registration.content_length,
            uploaded_by: registration.uploaded_by,
            source_url: None,
            uploaded_at: now.timestamp(),
        };
        self.images.upsert(&record).await?;

        Ok(UploadTicket { record, upload_url })
    }
}
