//! S3-based storage for vehicle images
mod error;

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{
    error::SdkError,
    operation::{
        create_bucket::CreateBucketError, head_bucket::HeadBucketError,
        list_objects_v2::ListObjectsV2Error,
    },
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier},
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

pub use error::{BucketError, BucketResult};

/// `DeleteObjects` accepts at most this many keys per call
const DELETE_BATCH_SIZE: usize = 1000;

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// An object listed from the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size_bytes: i64,
    /// Last modification time, when S3 reports one
    pub last_modified: Option<DateTime<Utc>>,
}

/// Image bucket client for S3 operations
pub struct ImageBucket {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    presigned_url_expiry_secs: u64,
}

impl ImageBucket {
    /// Creates a new image bucket client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for image storage
    /// * `presigned_url_expiry_secs` - Expiry of generated GET and PUT URLs
    #[must_use]
    pub const fn new(
        s3_client: Arc<S3Client>,
        bucket_name: String,
        presigned_url_expiry_secs: u64,
    ) -> Self {
        Self {
            s3_client,
            bucket_name,
            presigned_url_expiry_secs,
        }
    }

    /// Name of the backing bucket
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Checks whether the bucket exists and is reachable
    ///
    /// # Errors
    ///
    /// Returns `BucketError` for any failure other than a missing bucket
    pub async fn bucket_exists(&self) -> BucketResult<bool> {
        match self
            .s3_client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(HeadBucketError::is_not_found) => {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Makes sure the bucket exists, creating it if absent
    ///
    /// Returns `true` if the bucket was created by this call.
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the bucket cannot be checked or created
    #[instrument(skip(self), fields(bucket = %self.bucket_name))]
    pub async fn ensure_bucket(&self) -> BucketResult<bool> {
        if self.bucket_exists().await? {
            debug!("bucket already exists");
            return Ok(false);
        }

        let mut request = self.s3_client.create_bucket().bucket(&self.bucket_name);

        // us-east-1 rejects an explicit location constraint
        if let Some(region) = self
            .s3_client
            .config()
            .region()
            .map(ToString::to_string)
            .filter(|region| region != "us-east-1")
        {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("created S3 bucket");
                Ok(true)
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
            {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Uploads an object
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the put fails
    #[instrument(skip(self, body), fields(size = body.len()))]
    pub async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> BucketResult<()> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await?;

        info!("uploaded object to S3");
        Ok(())
    }

    /// Lists every object in the bucket, sorted by key
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if any page cannot be listed
    pub async fn list_objects(&self) -> BucketResult<Vec<ListedObject>> {
        let mut objects = self.list_all().await?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn list_all(&self) -> Result<Vec<ListedObject>, SdkError<ListObjectsV2Error>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .set_continuation_token(continuation_token.take())
                .send()
                .await?;

            objects.extend(page.contents().iter().filter_map(|object| {
                Some(ListedObject {
                    key: object.key()?.to_string(),
                    size_bytes: object.size().unwrap_or_default(),
                    last_modified: object
                        .last_modified()
                        .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())),
                })
            }));

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    fn presigning_config(&self) -> BucketResult<PresigningConfig> {
        PresigningConfig::expires_in(Duration::from_secs(self.presigned_url_expiry_secs)).map_err(
            |e| BucketError::ConfigError(format!("Failed to create presigning config: {e}")),
        )
    }

    fn expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::from_secs(self.presigned_url_expiry_secs)
    }

    /// Generates a presigned GET URL for displaying an object
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if presigning config creation fails
    /// Returns `BucketError::S3Error` if presigned URL generation fails
    pub async fn presigned_get_url(&self, key: &str) -> BucketResult<PresignedUrl> {
        let presigned = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_at: self.expires_at(),
        })
    }

    /// Generates a presigned PUT URL for uploading an object
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if presigning config creation fails
    /// Returns `BucketError::S3Error` if presigned URL generation fails
    pub async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: i64,
    ) -> BucketResult<PresignedUrl> {
        let presigned = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_length(content_length)
            .content_type(content_type)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_at: self.expires_at(),
        })
    }

    /// Empties and deletes the bucket; a missing bucket is not an error
    ///
    /// Returns `true` if a bucket was deleted.
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if listing, deleting objects or deleting the bucket fails
    #[instrument(skip(self), fields(bucket = %self.bucket_name))]
    pub async fn delete_bucket(&self) -> BucketResult<bool> {
        let objects = match self.list_all().await {
            Ok(objects) => objects,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(ListObjectsV2Error::is_no_such_bucket) =>
            {
                debug!("bucket already absent");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        for batch in objects.chunks(DELETE_BATCH_SIZE) {
            let identifiers = batch
                .iter()
                .map(|object| ObjectIdentifier::builder().key(&object.key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BucketError::ConfigError(e.to_string()))?;
            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .quiet(true)
                .build()
                .map_err(|e| BucketError::ConfigError(e.to_string()))?;

            self.s3_client
                .delete_objects()
                .bucket(&self.bucket_name)
                .delete(delete)
                .send()
                .await?;
            debug!(count = batch.len(), "deleted objects");
        }

        self.s3_client
            .delete_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await?;

        info!(objects = objects.len(), "deleted S3 bucket");
        Ok(true)
    }
}
