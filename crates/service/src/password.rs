//! Salted argon2id password hashing.
//!
//! Hashing is CPU-bound; async callers go through the `*_blocking` wrappers
//! so request handling is not stalled.

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use rand::rngs::OsRng;

use crate::errors::ServiceError;

pub const PASSWORD_ALGORITHM: &str = "argon2id";

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("hashing error: {}", e)))?
        .to_string();
    Ok(hash)
}

/// `false` for a wrong password; an unparsable stored hash is an internal error.
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ServiceError::Internal(format!("stored hash unreadable: {}", e)))?;
    Ok(Argon2::default().verify_password(candidate.as_bytes(), &parsed).is_ok())
}

pub async fn hash_password_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
}

pub async fn verify_password_blocking(candidate: String, stored_hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
}
