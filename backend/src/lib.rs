//! Approved Cars backend service
//!
//! Serves a page of approved vehicle images stored in S3, with per-image
//! metadata and login credentials in `DynamoDB`.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod gallery;
pub mod image_bucket;
pub mod object_key;
pub mod page;
pub mod provisioning;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;
