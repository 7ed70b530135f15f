use std::sync::{Arc, LazyLock};

use axum::{http::StatusCode, Extension, Json};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;
use vehicle_storage::login_credential::LoginCredentialStorage;

use crate::types::{AppError, ValidatedJson};

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,64}$").expect("Invalid regex"));

pub(crate) fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_username"))
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    /// 3-64 characters of letters, digits, `_`, `.` or `-`
    #[validate(custom(function = "validate_username", message = "invalid_username"))]
    pub username: String,
    /// 8-128 characters
    #[validate(length(min = 8, max = 128, message = "invalid_password"))]
    pub password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CredentialsResponse {
    pub username: String,
}

/// Stores a new login credential with an Argon2id password hash
///
/// # Errors
///
/// - `409 username_taken` - A credential with this username already exists
#[instrument(skip(credentials, payload), fields(username = %payload.username))]
pub async fn register(
    Extension(credentials): Extension<Arc<LoginCredentialStorage>>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<CredentialsResponse>), AppError> {
    let credential = credentials
        .create(&payload.username, &payload.password)
        .await?;

    info!("registered login");
    Ok((
        StatusCode::CREATED,
        Json(CredentialsResponse {
            username: credential.username,
        }),
    ))
}

/// Checks a username/password pair against the credentials table
///
/// # Errors
///
/// - `401 invalid_credentials` - Unknown username or wrong password
#[instrument(skip(credentials, payload), fields(username = %payload.username))]
pub async fn login(
    Extension(credentials): Extension<Arc<LoginCredentialStorage>>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> Result<Json<CredentialsResponse>, AppError> {
    if !credentials
        .verify(&payload.username, &payload.password)
        .await?
    {
        return Err(invalid_credentials());
    }

    Ok(Json(CredentialsResponse {
        username: payload.username,
    }))
}

pub(crate) const fn invalid_credentials() -> AppError {
    AppError::new(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "Invalid username or password",
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("inspector").is_ok());
        assert!(validate_username("car.fan_01-x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username("white space").is_err());
        assert!(validate_username("<script>").is_err());
    }

    #[test]
    fn test_password_length_validation() {
        let short = CredentialsRequest {
            username: "inspector".to_string(),
            password: "short".to_string(),
        };
        assert!(short.validate().is_err());

        let ok = CredentialsRequest {
            username: "inspector".to_string(),
            password: "long-enough".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
