//! Storage services for the approved cars gallery
//!
//! This crate owns every `DynamoDB` concern of the backend: the fixed table
//! schemas, creating and dropping those tables, the per-image metadata
//! records and the login credentials table.

pub mod login_credential;
pub mod table;
pub mod vehicle_image;
