pub mod auth;
pub mod images;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

/// Creates the v1 API router
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route("/v1/images", get(images::list_images))
        .api_route("/v1/images/upload-urls", post(images::create_upload_url))
        .api_route("/v1/auth/register", post(auth::register))
        .api_route("/v1/auth/login", post(auth::login))
}
