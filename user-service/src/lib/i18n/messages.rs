use std::fmt;

/// Stable identifiers of every client-visible message.
///
/// The identifier is what catalogs are keyed by; the default text is the
/// last-resort English rendering when no catalog has the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    InternalError,
    InvalidValue,
    InvalidBirthday,
    InvalidRole,
    RoleRequire,
    PasswordEncryptionFail,
    InvalidPassword,
    PasswordRequire,
    DuplicateUsername,
    InvalidUsername,
    UsernameRequire,
    InvalidClaim,
    PermissionRequire,
    AuthenRequire,
    InvalidAuthorHeader,
    InvalidUsernamePassword,
    FailCreateToken,
    NotFound,
    UpdateFail,
    CreateFail,
    DeleteFail,
}

impl MessageKey {
    pub const ALL: [MessageKey; 21] = [
        MessageKey::InternalError,
        MessageKey::InvalidValue,
        MessageKey::InvalidBirthday,
        MessageKey::InvalidRole,
        MessageKey::RoleRequire,
        MessageKey::PasswordEncryptionFail,
        MessageKey::InvalidPassword,
        MessageKey::PasswordRequire,
        MessageKey::DuplicateUsername,
        MessageKey::InvalidUsername,
        MessageKey::UsernameRequire,
        MessageKey::InvalidClaim,
        MessageKey::PermissionRequire,
        MessageKey::AuthenRequire,
        MessageKey::InvalidAuthorHeader,
        MessageKey::InvalidUsernamePassword,
        MessageKey::FailCreateToken,
        MessageKey::NotFound,
        MessageKey::UpdateFail,
        MessageKey::CreateFail,
        MessageKey::DeleteFail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::InternalError => "INTERNAL_ERROR",
            MessageKey::InvalidValue => "INVALID_VALUE",
            MessageKey::InvalidBirthday => "INVALID_BIRTHDAY",
            MessageKey::InvalidRole => "INVALID_ROLE",
            MessageKey::RoleRequire => "ROLE_REQUIRE",
            MessageKey::PasswordEncryptionFail => "PASSWORD_ENCRYPTION_FAIL",
            MessageKey::InvalidPassword => "INVALID_PASSWORD",
            MessageKey::PasswordRequire => "PASSWORD_REQUIRE",
            MessageKey::DuplicateUsername => "DUPLICATE_USERNAME",
            MessageKey::InvalidUsername => "INVALID_USERNAME",
            MessageKey::UsernameRequire => "USERNAME_REQUIRE",
            MessageKey::InvalidClaim => "INVALID_CLAIM",
            MessageKey::PermissionRequire => "PERMISSION_REQUIRE",
            MessageKey::AuthenRequire => "AUTHEN_REQUIRE",
            MessageKey::InvalidAuthorHeader => "INVALID_AUTHOR_HEADER",
            MessageKey::InvalidUsernamePassword => "INVALID_USERNAME_PASSWORD",
            MessageKey::FailCreateToken => "FAIL_CREATE_TOKEN",
            MessageKey::NotFound => "NOT_FOUND",
            MessageKey::UpdateFail => "UPDATE_FAIL",
            MessageKey::CreateFail => "CREATE_FAIL",
            MessageKey::DeleteFail => "DELETE_FAIL",
        }
    }

    pub fn default_text(&self) -> &'static str {
        match self {
            MessageKey::InternalError => "Internal server error",
            MessageKey::InvalidValue => "Invalid value",
            MessageKey::InvalidBirthday => {
                "Birthday must be in the format YYYY-MM-DD and the age must be between 5 and 100 years old"
            }
            MessageKey::InvalidRole => {
                "Role must be one of the following: admin, staff, or customer"
            }
            MessageKey::RoleRequire => "Role is required",
            MessageKey::PasswordEncryptionFail => "Password encryption failed",
            MessageKey::InvalidPassword => {
                "Password must be 8–36 characters long and contain only lowercase letters, numbers, dots, or underscores"
            }
            MessageKey::PasswordRequire => "Password is required",
            MessageKey::DuplicateUsername => "Username is already taken",
            MessageKey::InvalidUsername => {
                "Username must be 3–24 characters long and contain only lowercase letters, numbers, dots, or underscores"
            }
            MessageKey::UsernameRequire => "Username is required",
            MessageKey::InvalidClaim => "Invalid claims",
            MessageKey::PermissionRequire => "You do not have permission to access this resource",
            MessageKey::AuthenRequire => "Authentication required",
            MessageKey::InvalidAuthorHeader => "Missing or invalid Authorization header",
            MessageKey::InvalidUsernamePassword => "Invalid username or password",
            MessageKey::FailCreateToken => "Fail to create token",
            MessageKey::NotFound => "Not found item",
            MessageKey::UpdateFail => "Update failed",
            MessageKey::CreateFail => "Create failed",
            MessageKey::DeleteFail => "Delete failed",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
