//! Password hashing and verification using Argon2id.
//!
//! Hashes are stored as PHC strings (algorithm, parameters and salt included).
//! Both operations are CPU-heavy; async callers run them on the blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use crate::domain::errors::AuthError;

/// Hash of a throwaway password, verified against when a login names an
/// unknown email so both failure paths cost the same.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("not-a-real-password").unwrap_or_default());

/// Hashes a plaintext password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(format!("failed to hash password: {e}")))
}

/// Verifies a plaintext password against a stored PHC string.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if the stored hash is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AuthError::Internal("invalid password hash format".to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!(
            "failed to verify password: {e}"
        ))),
    }
}

/// Burns the same amount of work as a real verification and always fails.
pub fn verify_dummy(password: &str) -> bool {
    let _ = verify_password(password, &DUMMY_HASH);
    false
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("password hashing task failed: {e}")))?
}

/// Checks `password` against `hash` on the blocking thread pool.
///
/// With `hash == None` (unknown account) a dummy verification runs instead,
/// so the caller cannot be timed into revealing which accounts exist.
pub async fn check_password_blocking(
    password: String,
    hash: Option<String>,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => Ok(verify_dummy(&password)),
    })
    .await
    .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?
}
