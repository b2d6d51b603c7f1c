//! Password hashing and verification using Argon2id with a fixed work factor

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Memory cost in KiB
pub const MEMORY_COST_KIB: u32 = 19_456;

/// Number of passes over memory
pub const TIME_COST: u32 = 2;

/// Degree of parallelism
pub const PARALLELISM: u32 = 1;

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// Stored hash is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password for storage
///
/// The returned PHC string embeds the algorithm, version, parameters and
/// a random 16-byte salt, so [`verify_password`] needs nothing else.
///
/// # Example
/// ```
/// use membership_auth::password::hash_password;
///
/// let hash = hash_password("pw1").unwrap();
/// assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash
///
/// # Returns
/// * `Ok(true)` - Password matches hash
/// * `Ok(false)` - Password does not match hash
/// * `Err(PasswordError)` - Stored hash is malformed or verification broke down
///
/// # Example
/// ```
/// use membership_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("pw1").unwrap();
/// assert!(verify_password("pw1", &hash).unwrap());
/// assert!(!verify_password("pw2", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    // Parameters come from the PHC string, not from `hasher()`
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}
