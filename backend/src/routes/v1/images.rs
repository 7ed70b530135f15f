use std::sync::{Arc, LazyLock};

use axum::{http::StatusCode, Extension, Json};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;
use vehicle_storage::login_credential::LoginCredentialStorage;

use super::auth::{invalid_credentials, validate_username};
use crate::{
    gallery::{Gallery, GalleryEntry, UploadRegistration},
    object_key,
    types::{AppError, ValidatedJson},
};

static CONTENT_TYPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^image/[a-z0-9.+-]{1,64}$").expect("Invalid regex"));

fn validate_content_type(content_type: &str) -> Result<(), validator::ValidationError> {
    if CONTENT_TYPE_REGEX.is_match(content_type) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_content_type"))
    }
}

/// Without an explicit content type the file name must carry an image extension
fn validate_image_upload(request: &UploadRequest) -> Result<(), validator::ValidationError> {
    if request.content_type.is_some() || object_key::image_content_type(&request.filename).is_some() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unsupported_image_type")
            .with_message("unsupported_image_type".into()))
    }
}

fn validate_filename(filename: &str) -> Result<(), validator::ValidationError> {
    if filename.trim().is_empty() || filename.chars().any(char::is_control) {
        Err(validator::ValidationError::new("invalid_filename"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ImageResponse {
    /// Object key in the gallery bucket
    pub object_key: String,
    /// Presigned GET URL of the image
    pub image_url: String,
    /// Size in bytes
    pub size_bytes: i64,
    /// Original file name, when a metadata record exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Uploader, when a metadata record exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    /// ISO-8601 UTC upload time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

impl From<GalleryEntry> for ImageResponse {
    fn from(entry: GalleryEntry) -> Self {
        let uploaded_at = entry.uploaded_at().map(|at| at.to_rfc3339());
        let (original_name, uploaded_by) = entry
            .metadata
            .map(|m| (m.original_name, m.uploaded_by))
            .unzip();

        Self {
            object_key: entry.object_key,
            image_url: entry.image_url,
            size_bytes: entry.size_bytes,
            original_name,
            uploaded_by,
            uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
}

/// Lists the gallery images as JSON, newest first
///
/// Unlike the HTML page this does not provision or seed anything.
#[instrument(skip(gallery))]
pub async fn list_images(
    Extension(gallery): Extension<Arc<Gallery>>,
) -> Result<Json<ImageListResponse>, AppError> {
    let entries = gallery.list_entries().await?;

    Ok(Json(ImageListResponse {
        images: entries.into_iter().map(ImageResponse::from).collect(),
    }))
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_image_upload"))]
pub struct UploadRequest {
    /// Original file name, used for the key extension and metadata
    #[validate(
        length(max = 255, message = "invalid_filename"),
        custom(function = "validate_filename", message = "invalid_filename")
    )]
    pub filename: String,
    /// `image/*` MIME type; guessed from the file name when absent, in which
    /// case the name needs an image extension
    #[validate(custom(function = "validate_content_type", message = "invalid_content_type"))]
    pub content_type: Option<String>,
    /// Size in bytes - max 15 MiB
    #[validate(range(min = 1, max = 15_728_640, message = "invalid_content_length"))]
    pub content_length: i64,
    /// Uploader's username
    #[validate(custom(function = "validate_username", message = "invalid_username"))]
    pub username: String,
    /// Uploader's password
    #[validate(length(min = 8, max = 128, message = "invalid_password"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// Unique key reserved for the image
    pub object_key: String,
    /// Presigned URL to PUT the image to
    pub presigned_url: String,
    /// Content type the PUT must carry
    pub content_type: String,
    /// ISO-8601 UTC timestamp when the presigned URL expires
    pub expires_at: String,
}

/// Reserves a unique object key for a new vehicle image
///
/// 1. Verifies the uploader's credentials
/// 2. Generates a unique object key and a presigned PUT URL
/// 3. Stores the image's metadata record
///
/// # Errors
///
/// - `401 invalid_credentials` - Unknown username or wrong password
/// - `BucketError` - Presigned URL generation failed
/// - `VehicleImageStorageError` - Metadata write failed
#[instrument(skip(gallery, credentials, payload), fields(username = %payload.username))]
pub async fn create_upload_url(
    Extension(gallery): Extension<Arc<Gallery>>,
    Extension(credentials): Extension<Arc<LoginCredentialStorage>>,
    ValidatedJson(payload): ValidatedJson<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    if !credentials
        .verify(&payload.username, &payload.password)
        .await?
    {
        return Err(invalid_credentials());
    }

    let ticket = gallery
        .register_upload(UploadRegistration {
            filename: payload.filename,
            content_type: payload.content_type,
            content_length: payload.content_length,
            uploaded_by: payload.username,
        })
        .await?;

    info!(object_key = %ticket.record.object_key, "registered upload");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            object_key: ticket.record.object_key,
            presigned_url: ticket.upload_url.url,
            content_type: ticket.record.content_type,
            expires_at: ticket.upload_url.expires_at.to_rfc3339(),
        }),
    ))
}
