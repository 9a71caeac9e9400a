use thiserror::Error;

/// Error type for password operations.
///
/// Verification never fails: a malformed stored hash is a non-match.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
