use std::sync::Arc;

use axum::{response::Html, Extension};
use tracing::instrument;

use crate::{gallery::Gallery, page, types::AppError};

/// The approved vehicles page
///
/// Provisions missing resources, seeds the demo image, then renders every
/// stored image.
#[instrument(skip(gallery))]
pub async fn handler(
    Extension(gallery): Extension<Arc<Gallery>>,
) -> Result<Html<String>, AppError> {
    let entries = gallery.load_page().await?;
    Ok(Html(page::render(&entries)?))
}
