use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// `sub` is the natural key of the principal (its username) and `id` the
/// numeric surrogate key. `role` is informational: the gate re-reads the role
/// from storage on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Numeric user identifier
    pub id: i64,

    /// Role at issuance time
    #[serde(default)]
    pub role: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Create claims for an authenticated user expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `subject` - Username of the principal
    /// * `id` - Numeric user id
    /// * `role` - Role name at issuance time
    /// * `issuer` - Token issuer
    /// * `ttl` - Time until expiry (must be positive)
    pub fn for_user(
        subject: impl ToString,
        id: i64,
        role: impl ToString,
        issuer: impl ToString,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: subject.to_string(),
            id,
            role: role.to_string(),
            iss: issuer.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
        }
    }
}
