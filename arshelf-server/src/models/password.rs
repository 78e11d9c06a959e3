//! Password validation and hashing
//!
//! A [`Password`] can only be built from a plaintext of at least
//! [`MIN_PASSWORD_LEN`] characters, and [`PasswordHash::hash`] only accepts a
//! `Password`. Short passwords are therefore rejected before any hash work
//! starts. Hashing is salted bcrypt at cost [`HASH_COST`], run on the blocking
//! pool.

use std::fmt;

use super::ValidationError;

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt work factor
pub const HASH_COST: u32 = 10;

/// Errors from the hashing backend
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Validated plaintext password. Never printed.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        if s.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Stored bcrypt hash
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a validated password.
    pub async fn hash(password: Password) -> Result<Self, PasswordError> {
        let hashed =
            tokio::task::spawn_blocking(move || bcrypt::hash(password.0, HASH_COST)).await??;
        Ok(Self(hashed))
    }

    /// Wrap a hash loaded from the store.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Check a plaintext candidate against this hash.
    pub async fn verify(&self, candidate: &str) -> Result<bool, PasswordError> {
        let hash = self.0.clone();
        let candidate = candidate.to_owned();
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash)).await??;
        Ok(ok)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}
