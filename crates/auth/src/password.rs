//! Credential verification (Argon2id, fixed cost).

use std::sync::OnceLock;

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use thiserror::Error;

/// Memory cost in KiB.
const M_COST: u32 = 19_456;
const T_COST: u32 = 2;
const P_COST: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Hashing itself failed (never a user error).
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Wrong password, or the stored hash could not be used. Deliberately
    /// a single variant.
    #[error("invalid credentials")]
    Mismatch,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(M_COST, T_COST, P_COST, None)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash string.
///
/// An unparseable hash yields the same `Mismatch` as a wrong password.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;
    hasher()?
        .verify_password(plaintext.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// Burn one verification against a throwaway hash.
///
/// Used when no account matches the supplied email so that the response time
/// does not reveal whether the account exists.
pub fn dummy_verify(plaintext: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| hash_password("fieldops-dummy-password").ok());
    if let Some(hash) = hash {
        let _ = verify_password(plaintext, hash);
    }
}
