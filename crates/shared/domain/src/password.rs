//! Password value object.
//!
//! Registration hashes the plain-text password here before the directory
//! ever sees it; the directory only stores the resulting opaque credential.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

use crate::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Argon2-hashed password.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain-text password.
    ///
    /// # Errors
    /// Returns a password error if the length is outside the accepted range.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        let len = plain_text.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(DomainError::password(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(DomainError::password(format!(
                "Password cannot be more than {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    pub fn into_string(self) -> String {
        self.hash
    }
}
