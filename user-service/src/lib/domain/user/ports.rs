use async_trait::async_trait;
use auth::AuthenticationResult;

use crate::context::RequestContext;
use crate::domain::pagination::Page;
use crate::domain::pagination::Pagination;
use crate::domain::user::models::CreateUserInput;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::UpdateUserInput;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Validate and persist a new user.
    ///
    /// # Arguments
    /// * `ctx` - Request context (deadline, locale, principal)
    /// * `input` - Raw create request
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `Validation` - One or more fields are invalid
    /// * `CreateFailed` - Store rejected the insert
    async fn create_user(&self, ctx: &RequestContext, input: CreateUserInput)
        -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<User, UserError>;

    /// Retrieve user by username.
    ///
    /// # Errors
    /// * `UnknownUsername` - No user with this username
    /// * `DatabaseError` - Database operation failed
    async fn get_user_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<User, UserError>;

    /// List users matching an optional search term.
    ///
    /// # Arguments
    /// * `pagination` - Normalized limit, page and ordering
    /// * `search` - Case-insensitive substring of username or full name
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(
        &self,
        ctx: &RequestContext,
        pagination: Pagination,
        search: Option<String>,
    ) -> Result<Page<User>, UserError>;

    /// Apply a partial update.
    ///
    /// # Arguments
    /// * `id` - User ID to update, excluded from the uniqueness check
    /// * `input` - Raw update request; absent fields are kept
    ///
    /// # Returns
    /// User entity reloaded after the write
    ///
    /// # Errors
    /// * `Validation` - One or more fields are invalid
    /// * `NotFound` - User does not exist
    /// * `UpdateFailed` - Store rejected the update
    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: UserId,
        input: UpdateUserInput,
    ) -> Result<User, UserError>;

    /// Soft-delete a user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DeleteFailed` - Store rejected the delete
    async fn delete_user(&self, ctx: &RequestContext, id: UserId) -> Result<(), UserError>;

    /// Verify credentials and issue a bearer token.
    ///
    /// # Errors
    /// * `UnknownUsername` - No user with this username
    /// * `PasswordMismatch` - Password does not match the stored hash
    /// * `TokenCreation` - Token signing failed
    /// * `DatabaseError` - Lookup failed
    async fn login(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, UserError>;
}

/// Persistence operations for users.
///
/// Every call observes `ctx`'s deadline; soft-deleted rows are invisible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a user inside one transaction.
    ///
    /// # Returns
    /// Stored user with generated id and timestamps
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, ctx: &RequestContext, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, ctx: &RequestContext, id: UserId)
        -> Result<Option<User>, UserError>;

    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<Option<User>, UserError>;

    /// Check whether a username is held by a user other than `exclude`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn username_taken(
        &self,
        ctx: &RequestContext,
        username: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, UserError>;

    /// Apply changes inside one transaction and return the reloaded row.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        ctx: &RequestContext,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, UserError>;

    /// Soft-delete a user inside one transaction.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, ctx: &RequestContext, id: UserId) -> Result<(), UserError>;

    /// Retrieve one page of users and the total number of matches.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list(
        &self,
        ctx: &RequestContext,
        pagination: &Pagination,
        search: Option<String>,
    ) -> Result<(Vec<User>, i64), UserError>;
}
