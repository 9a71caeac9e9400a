use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationResult;
use auth::Authenticator;
use chrono::NaiveDate;
use tokio::sync::OnceCell;

use crate::context::RequestContext;
use crate::domain::pagination::Page;
use crate::domain::pagination::Pagination;
use crate::domain::user::models::parse_birthday;
use crate::domain::user::models::CreateUserInput;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateUserInput;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::validation::FieldValidator;
use crate::domain::user::validation::ValidationReport;
use crate::i18n::MessageKey;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    validator: FieldValidator<UR>,
    /// Hash verified against when the username is unknown.
    decoy_hash: OnceCell<String>,
}

const DECOY_PASSWORD: &str = "decoy.password";

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    /// * `uniqueness_timeout` - Upper bound for the username uniqueness lookup
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(
        repository: Arc<UR>,
        authenticator: Arc<Authenticator>,
        uniqueness_timeout: Duration,
    ) -> Self {
        Self {
            validator: FieldValidator::new(Arc::clone(&repository), uniqueness_timeout),
            repository,
            authenticator,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Replace the clock used for birthday age checks.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.validator = self.validator.with_clock(today);
        self
    }

    /// Create an administrator unless a live user already holds `username`.
    ///
    /// # Returns
    /// The created user, or `None` when the username is already in use
    ///
    /// # Errors
    /// * `Validation` - Username or password does not meet the format rules
    /// * `DatabaseError` - Database operation failed
    pub async fn bootstrap_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        if self
            .repository
            .find_by_username(ctx, username)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        // Update rules: formats and uniqueness without the create-only requirements.
        let input = UpdateUserInput {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        };
        let report = self.validator.validate(ctx, &input, None).await;
        if !report.is_valid() {
            return Err(UserError::Validation(report));
        }

        let user = self
            .repository
            .create(
                ctx,
                NewUser {
                    username: username.to_string(),
                    password_hash: self.hash_password(password.to_string()).await?,
                    full_name: None,
                    birthday: None,
                    role: Role::Admin,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap administrator created");

        Ok(Some(user))
    }

    /// Hash on the blocking pool.
    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        let outcome =
            tokio::task::spawn_blocking(move || authenticator.hash_password(&password)).await;

        match outcome {
            Ok(Ok(hash)) => Ok(hash),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Password hashing failed");
                Err(UserError::Validation(ValidationReport::single(
                    "password",
                    MessageKey::PasswordEncryptionFail,
                )))
            }
            Err(e) => Err(UserError::Internal(format!("Hashing task failed: {}", e))),
        }
    }

    async fn decoy_hash(&self) -> Result<String, UserError> {
        self.decoy_hash
            .get_or_try_init(|| self.hash_password(DECOY_PASSWORD.to_string()))
            .await
            .cloned()
            .map_err(|e| UserError::Internal(format!("Decoy hash unavailable: {}", e)))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, UserError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &hash))
            .await
            .map_err(|e| UserError::Internal(format!("Verification task failed: {}", e)))
    }
}

/// Non-empty value of an optional field.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(
        &self,
        ctx: &RequestContext,
        input: CreateUserInput,
    ) -> Result<User, UserError> {
        let report = self.validator.validate(ctx, &input, None).await;
        if !report.is_valid() {
            return Err(UserError::Validation(report));
        }

        // Presence and format were checked by the rule table.
        let (Some(username), Some(password), Some(role), Some(birthday)) = (
            supplied(input.username),
            supplied(input.password),
            supplied(input.role).and_then(|role| role.parse::<Role>().ok()),
            supplied(input.birthday).as_deref().and_then(parse_birthday),
        ) else {
            return Err(UserError::Internal(
                "Validated create input is incomplete".to_string(),
            ));
        };

        let new_user = NewUser {
            username,
            password_hash: self.hash_password(password).await?,
            full_name: supplied(input.full_name),
            birthday: Some(birthday),
            role,
        };

        let user = self
            .repository
            .create(ctx, new_user)
            .await
            .map_err(|e| {
                tracing::error!(request_id = %ctx.request_id(), error = %e, "Failed to create user");
                UserError::CreateFailed(e.to_string())
            })?;

        tracing::info!(
            request_id = %ctx.request_id(),
            actor = ctx.principal().map(|principal| principal.subject.as_str()),
            user_id = %user.id,
            role = %user.role,
            "User created"
        );

        Ok(user)
    }

    async fn get_user(&self, ctx: &RequestContext, id: UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(ctx, id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn get_user_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<User, UserError> {
        self.repository
            .find_by_username(ctx, username)
            .await?
            .ok_or_else(|| UserError::UnknownUsername(username.to_string()))
    }

    async fn list_users(
        &self,
        ctx: &RequestContext,
        pagination: Pagination,
        search: Option<String>,
    ) -> Result<Page<User>, UserError> {
        let search = supplied(search.map(|term| term.trim().to_string()));
        let (users, total_rows) = self.repository.list(ctx, &pagination, search).await?;

        Ok(Page::new(pagination, total_rows, users))
    }

    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: UserId,
        input: UpdateUserInput,
    ) -> Result<User, UserError> {
        let report = self.validator.validate(ctx, &input, Some(id)).await;
        if !report.is_valid() {
            return Err(UserError::Validation(report));
        }

        let password_hash = match supplied(input.password) {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username: supplied(input.username),
            password_hash,
            full_name: supplied(input.full_name),
            birthday: supplied(input.birthday).as_deref().and_then(parse_birthday),
            role: supplied(input.role).and_then(|role| role.parse::<Role>().ok()),
        };
        if changes.is_empty() {
            return self.get_user(ctx, id).await;
        }

        let user = self
            .repository
            .update(ctx, id, changes)
            .await
            .map_err(|e| match e {
                UserError::NotFound(_) => e,
                _ => {
                    tracing::error!(request_id = %ctx.request_id(), user_id = %id, error = %e, "Failed to update user");
                    UserError::UpdateFailed(e.to_string())
                }
            })?;

        tracing::info!(
            request_id = %ctx.request_id(),
            actor = ctx.principal().map(|principal| principal.subject.as_str()),
            user_id = %id,
            "User updated"
        );

        Ok(user)
    }

    async fn delete_user(&self, ctx: &RequestContext, id: UserId) -> Result<(), UserError> {
        self.repository
            .delete(ctx, id)
            .await
            .map_err(|e| match e {
                UserError::NotFound(_) => e,
                _ => {
                    tracing::error!(request_id = %ctx.request_id(), user_id = %id, error = %e, "Failed to delete user");
                    UserError::DeleteFailed(e.to_string())
                }
            })?;

        tracing::info!(
            request_id = %ctx.request_id(),
            actor = ctx.principal().map(|principal| principal.subject.as_str()),
            user_id = %id,
            "User deleted"
        );

        Ok(())
    }

    async fn login(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, UserError> {
        let Some(user) = self.repository.find_by_username(ctx, username).await? else {
            // Same Argon2 cost as a wrong password.
            self.verify_password(password.to_string(), self.decoy_hash().await?)
                .await?;
            tracing::info!(request_id = %ctx.request_id(), "Login rejected for unknown username");
            return Err(UserError::UnknownUsername(username.to_string()));
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            tracing::info!(request_id = %ctx.request_id(), user_id = %user.id, "Login rejected");
            return Err(UserError::PasswordMismatch);
        }

        let token = self
            .authenticator
            .issue_token(&user.username, user.id.0, user.role.as_str())?;

        tracing::info!(
            request_id = %ctx.request_id(),
            user_id = %user.id,
            expires_at = token.expires_at,
            "Login succeeded"
        );

        Ok(token)
    }
}
