//! Login credential storage integration using Dynamo DB
//!
//! Passwords never reach the table in clear text; only Argon2id PHC strings
//! are stored.

mod error;
mod password;

use std::sync::{Arc, LazyLock};

use aws_sdk_dynamodb::{error::SdkError, types::AttributeValue, Client as DynamoDbClient};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

pub use error::{LoginCredentialStorageError, LoginCredentialStorageResult};
pub use password::{hash_password, verify_password};

use crate::table::TableSpec;

/// Hash checked for unknown usernames so every login costs one Argon2 run
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// Runs CPU-bound Argon2 work on the blocking thread pool
async fn spawn_password_task<T, F>(task: F) -> LoginCredentialStorageResult<T>
where
    F: FnOnce() -> LoginCredentialStorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

/// Verifies `password` against the credential, or against a placeholder hash
/// when there is none
fn check_password(
    password: &str,
    credential: Option<&LoginCredential>,
) -> LoginCredentialStorageResult<bool> {
    match credential {
        Some(credential) => verify_password(password, &credential.password_hash),
        None => {
            if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                verify_password(password, hash)?;
            }
            Ok(false)
        }
    }
}

/// Attribute names for the login credential table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoginCredentialAttribute {
    /// Username (Primary Key)
    Username,
    /// Argon2id PHC string
    PasswordHash,
    /// Created At
    CreatedAt,
}

/// Login credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredential {
    /// Username (Primary Key)
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Creation timestamp in unix seconds
    pub created_at: i64,
}

/// Login credential storage client for Dynamo DB operations
pub struct LoginCredentialStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl LoginCredentialStorage {
    /// Creates a new login credential storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured Dynamo DB client
    /// * `table_name` - Dynamo DB table name for login credentials
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    /// Fixed schema of the login credential table
    #[must_use]
    pub fn table_spec(table_name: &str) -> TableSpec {
        TableSpec::new(table_name, LoginCredentialAttribute::Username.to_string())
    }

    /// Name of the backing table
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates a credential, hashing the password
    ///
    /// # Errors
    ///
    /// Returns `LoginCredentialStorageError::UsernameTaken` if the username exists,
    /// or another `LoginCredentialStorageError` if hashing or the put fails
    pub async fn create(
        &self,
        username: &str,
        password: &str,
    ) -> LoginCredentialStorageResult<LoginCredential> {
        let password = password.to_string();
        let password_hash = spawn_password_task(move || hash_password(&password)).await?;

        let credential = LoginCredential {
            username: username.to_string(),
            password_hash,
            created_at: Utc::now().timestamp(),
        };

        let item = serde_dynamo::to_item(&credential)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", LoginCredentialAttribute::Username.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    LoginCredentialStorageError::UsernameTaken
                } else {
                    err.into()
                }
            })?;

        Ok(credential)
    }

    /// Gets a credential by username
    ///
    /// # Errors
    ///
    /// Returns `LoginCredentialStorageError` if the Dynamo DB operation fails
    pub async fn get(&self, username: &str) -> LoginCredentialStorageResult<Option<LoginCredential>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                LoginCredentialAttribute::Username.to_string(),
                AttributeValue::S(username.to_string()),
            )
            .consistent_read(true)
            .send()
            .await?;

        response
            .item
            .map(|item| serde_dynamo::from_item::<_, LoginCredential>(item))
            .transpose()
            .map_err(LoginCredentialStorageError::from)
    }

    /// Checks a username/password pair
    ///
    /// Unknown usernames verify as `false` after the same amount of hashing
    /// work as a known one.
    ///
    /// # Errors
    ///
    /// Returns `LoginCredentialStorageError` if the lookup fails or the stored hash is malformed
    pub async fn verify(&self, username: &str, password: &str) -> LoginCredentialStorageResult<bool> {
        let credential = self.get(username).await?;
        if credential.is_none() {
            debug!(username, "login for unknown user");
        }

        let password = password.to_string();
        spawn_password_task(move || check_password(&password, credential.as_ref())).await
    }

    /// Deletes a credential by username
    ///
    /// # Errors
    ///
    /// Returns `LoginCredentialStorageError` if the Dynamo DB operation fails
    pub async fn delete(&self, username: &str) -> LoginCredentialStorageResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                LoginCredentialAttribute::Username.to_string(),
                AttributeValue::S(username.to_string()),
            )
            .send()
            .await?;

        Ok(())
    }
}
