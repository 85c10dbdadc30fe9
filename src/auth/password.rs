use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use validator::ValidationError;

/// bcrypt ignores everything past this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Rejects passwords bcrypt would silently truncate.
///
/// The limit is in bytes, so multi-byte characters count more than once.
pub fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(format!("must be at most {} bytes", MAX_PASSWORD_BYTES).into());
        return Err(err);
    }
    Ok(())
}

/// Hashes a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored hash.
///
/// A hash that cannot be parsed counts as a mismatch, so a corrupt record
/// fails login with 401 rather than 500.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("stored password hash could not be verified: {}", e);
            false
        }
    }
}
