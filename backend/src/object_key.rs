//! Unique object keys for uploaded vehicle images
//!
//! Keys look like `vehicles/20261019T120000Z-<uuid>.png`: the UTC upload
//! time keeps listings roughly chronological and the UUID makes every key
//! unique, so two uploads of `car.png` never overwrite each other.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix of every gallery object
pub const KEY_PREFIX: &str = "vehicles/";

const FALLBACK_EXTENSION: &str = "bin";

/// Generates a fresh object key for a file with the given original name
#[must_use]
pub fn generate(original_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{KEY_PREFIX}{}-{}.{}",
        now.format("%Y%m%dT%H%M%SZ"),
        Uuid::new_v4().simple(),
        extension(original_name).unwrap_or(FALLBACK_EXTENSION)
    )
}

/// Known extension of a file name, matched case-insensitively
fn extension(name: &str) -> Option<&'static str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    KNOWN_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(known, _)| *known)
}

/// Extensions accepted for gallery uploads and their MIME types
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("avif", "image/avif"),
];

/// Image MIME type for a file name with a known image extension
#[must_use]
pub fn image_content_type(name: &str) -> Option<&'static str> {
    let ext = extension(name)?;
    KNOWN_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Guesses a MIME type from a file name's extension
#[must_use]
pub fn content_type_for(name: &str) -> String {
    image_content_type(name).map_or_else(
        || mime::APPLICATION_OCTET_STREAM.to_string(),
        ToString::to_string,
    )
}
