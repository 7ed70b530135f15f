//! Argon2id password hashing

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use super::{LoginCredentialStorageError, LoginCredentialStorageResult};

/// Hashes a password into a PHC string with a random salt
///
/// # Errors
///
/// Returns `LoginCredentialStorageError::PasswordHashError` if hashing fails
pub fn hash_password(password: &str) -> LoginCredentialStorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LoginCredentialStorageError::PasswordHashError(e.to_string()))
}

/// Checks a password against a stored PHC string
///
/// A wrong password is `Ok(false)`; only a malformed hash is an error.
///
/// # Errors
///
/// Returns `LoginCredentialStorageError::PasswordHashError` if the stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> LoginCredentialStorageResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| LoginCredentialStorageError::PasswordHashError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(
            result,
            Err(LoginCredentialStorageError::PasswordHashError(_))
        ));
    }
}
