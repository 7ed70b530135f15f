mod docs;
mod health;
mod page;
pub mod v1;

use aide::axum::{routing::get as api_get, ApiRouter};
use axum::routing::get;

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .route("/", get(page::handler))
        .api_route("/health", api_get(health::handler))
        .merge(v1::handler())
}
