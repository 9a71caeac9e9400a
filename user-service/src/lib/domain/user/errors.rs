use thiserror::Error;

use crate::domain::user::models::UserId;
use crate::domain::user::validation::ValidationReport;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user id: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(ValidationReport),

    #[error("User not found: {0}")]
    NotFound(UserId),

    // Login failures; both render the same client message
    #[error("No user with username: {0}")]
    UnknownUsername(String),

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Token creation failed: {0}")]
    TokenCreation(#[from] auth::JwtError),

    // Write failures surfaced as business errors
    #[error("Create failed: {0}")]
    CreateFailed(String),

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

