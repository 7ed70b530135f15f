//! HTML rendering of the approved vehicles page
//!
//! The markup lives in `templates/gallery.html`, embedded at compile time and
//! rendered by `tera` with HTML autoescaping.

use std::sync::LazyLock;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::gallery::GalleryEntry;

const TITLE: &str = "Approved Vehicles";
const TEMPLATE_NAME: &str = "gallery.html";

static TEMPLATES: LazyLock<tera::Result<Tera>> = LazyLock::new(|| {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html"]);
    tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/gallery.html"))?;
    Ok(tera)
});

/// Result type for page rendering
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while rendering the page
#[derive(Debug, Error)]
pub enum PageError {
    /// The embedded template failed to compile
    #[error("Failed to compile page template: {0}")]
    Template(String),

    /// Rendering the template failed
    #[error("Failed to render page: {0}")]
    Render(#[from] tera::Error),
}

/// Template view of one gallery entry
#[derive(Debug, Serialize)]
struct Card<'a> {
    image_url: &'a str,
    name: &'a str,
    uploaded_by: Option<&'a str>,
    uploaded_at: Option<String>,
    size: String,
}

impl<'a> From<&'a GalleryEntry> for Card<'a> {
    fn from(entry: &'a GalleryEntry) -> Self {
        Self {
            image_url: &entry.image_url,
            name: entry
                .metadata
                .as_ref()
                .map_or(entry.object_key.as_str(), |m| m.original_name.as_str()),
            uploaded_by: entry.metadata.as_ref().map(|m| m.uploaded_by.as_str()),
            uploaded_at: entry
                .uploaded_at()
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
            size: human_size(entry.size_bytes),
        }
    }
}

/// Renders the full page for the given entries
///
/// # Errors
///
/// Returns `PageError` if the template cannot be compiled or rendered
pub fn render(entries: &[GalleryEntry]) -> PageResult<String> {
    let tera = TEMPLATES
        .as_ref()
        .map_err(|e| PageError::Template(e.to_string()))?;

    let cards: Vec<Card<'_>> = entries.iter().map(Card::from).collect();

    let mut context = Context::new();
    context.insert("title", TITLE);
    context.insert("cards", &cards);

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes.max(0) as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use vehicle_storage::vehicle_image::VehicleImage;

    use super::*;

    fn entry(metadata: Option<VehicleImage>) -> GalleryEntry {
        GalleryEntry {
            object_key: "vehicles/20261019T120000Z-abc.png".to_string(),
            image_url: "http://localhost:4566/bucket/key?X-Amz-Signature=1&X-Amz-Date=2".to_string(),
            size_bytes: 2048,
            last_modified: None,
            metadata,
        }
    }

    #[test]
    fn test_template_compiles() {
        assert!(TEMPLATES.is_ok());
    }

    #[test]
    fn test_render_empty_state() {
        let html = render(&[]).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Approved Vehicles</h1>"));
        assert!(html.contains("No approved vehicles yet."));
        assert!(!html.contains("class=\"card\""));
    }

    #[test]
    fn test_render_entry_with_metadata() {
        let html = render(&[entry(Some(VehicleImage {
            object_key: "vehicles/20261019T120000Z-abc.png".to_string(),
            original_name: "<b>car</b>.png".to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 2048,
            uploaded_by: "inspector".to_string(),
            source_url: None,
            uploaded_at: 1_760_875_200,
        }))])
        .unwrap();

        assert!(html.contains("1 image(s)"));
        assert!(html.contains("&lt;b&gt;car&lt;&#x2F;b&gt;.png"));
        assert!(!html.contains("<b>car</b>"));
        assert!(html.contains("Uploaded by inspector"));
        assert!(html.contains("2025-10-19 12:00 UTC"));
        assert!(html.contains("2.0 KiB"));
        // Query string separators are escaped inside the attribute
        assert!(html.contains("X-Amz-Signature=1&amp;X-Amz-Date=2"));
    }

    #[test]
    fn test_render_escapes_uploader_and_url_quotes() {
        let mut image = entry(Some(VehicleImage {
            object_key: "vehicles/x.png".to_string(),
            original_name: "car.png".to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 10,
            uploaded_by: "<script>alert(1)</script>".to_string(),
            source_url: None,
            uploaded_at: 1_760_875_200,
        }));
        image.image_url = "\" onerror=\"alert(1)".to_string();

        let html = render(&[image]).unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("\" onerror=\""));
        assert!(html.contains("&quot; onerror=&quot;alert(1)"));
    }

    #[test]
    fn test_render_entry_without_metadata_uses_key() {
        let html = render(&[entry(None)]).unwrap();
        assert!(html.contains("<h3>vehicles&#x2F;20261019T120000Z-abc.png</h3>"));
        assert!(!html.contains("Uploaded by"));
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KiB");
        assert_eq!(human_size(15 * 1024 * 1024), "15.0 MiB");
    }
}
