use std::future::Future;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::context::RequestContext;
use crate::domain::pagination::Pagination;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: Option<String>,
    birthday: Option<NaiveDate>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| UserError::DatabaseError(format!("User {}: {}", row.id, e)))?;

        Ok(User {
            id: UserId(row.id),
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            birthday: row.birthday,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Run `query` until the request deadline at the latest.
///
/// Dropping the future on expiry cancels the statement and rolls back any
/// open transaction.
async fn within_deadline<T, F>(
    ctx: &RequestContext,
    operation: &'static str,
    query: F,
) -> Result<T, UserError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout_at(ctx.deadline(), query).await {
        Ok(result) => result.map_err(|e| {
            tracing::error!(request_id = %ctx.request_id(), operation, error = %e, "Query failed");
            UserError::DatabaseError(e.to_string())
        }),
        Err(_) => {
            tracing::warn!(request_id = %ctx.request_id(), operation, "Query exceeded request deadline");
            Err(UserError::DatabaseError(format!(
                "{} exceeded request deadline",
                operation
            )))
        }
    }
}

/// Escape LIKE metacharacters so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, ctx: &RequestContext, user: NewUser) -> Result<User, UserError> {
        let row = within_deadline(ctx, "create user", async {
            let mut tx = self.pool.begin().await?;

            let row: UserRow = sqlx::query_as(
                r#"
                INSERT INTO users (username, password_hash, full_name, birthday, role)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, username, password_hash, full_name, birthday, role, created_at, updated_at
                "#,
            )
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(user.birthday)
            .bind(user.role.as_str())
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(row)
        })
        .await?;

        row.try_into()
    }

    async fn find_by_id(
        &self,
        ctx: &RequestContext,
        id: UserId,
    ) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = within_deadline(
            ctx,
            "find user by id",
            sqlx::query_as(
                r#"
                SELECT id, username, password_hash, full_name, birthday, role, created_at, updated_at
                FROM users
                WHERE id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(id.0)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = within_deadline(
            ctx,
            "find user by username",
            sqlx::query_as(
                r#"
                SELECT id, username, password_hash, full_name, birthday, role, created_at, updated_at
                FROM users
                WHERE username = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn username_taken(
        &self,
        ctx: &RequestContext,
        username: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, UserError> {
        within_deadline(
            ctx,
            "check username",
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM users
                    WHERE username = $1
                      AND deleted_at IS NULL
                      AND ($2::BIGINT IS NULL OR id <> $2)
                )
                "#,
            )
            .bind(username)
            .bind(exclude.map(|id| id.0))
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, UserError> {
        let row = within_deadline(ctx, "update user", async {
            let mut tx = self.pool.begin().await?;

            let row: Option<UserRow> = sqlx::query_as(
                r#"
                UPDATE users
                SET username = COALESCE($2, username),
                    password_hash = COALESCE($3, password_hash),
                    full_name = COALESCE($4, full_name),
                    birthday = COALESCE($5, birthday),
                    role = COALESCE($6, role),
                    updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING id, username, password_hash, full_name, birthday, role, created_at, updated_at
                "#,
            )
            .bind(id.0)
            .bind(&changes.username)
            .bind(&changes.password_hash)
            .bind(&changes.full_name)
            .bind(changes.birthday)
            .bind(changes.role.map(|role| role.as_str()))
            .fetch_optional(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(row)
        })
        .await?;

        row.ok_or(UserError::NotFound(id))?.try_into()
    }

    async fn delete(&self, ctx: &RequestContext, id: UserId) -> Result<(), UserError> {
        let rows_affected = within_deadline(ctx, "delete user", async {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query(
                r#"
                UPDATE users
                SET deleted_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(result.rows_affected())
        })
        .await?;

        if rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }

        Ok(())
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        pagination: &Pagination,
        search: Option<String>,
    ) -> Result<(Vec<User>, i64), UserError> {
        let pattern = search.as_deref().map(like_pattern);

        let total_rows: i64 = within_deadline(
            ctx,
            "count users",
            sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM users
                WHERE deleted_at IS NULL
                  AND ($1::TEXT IS NULL OR username ILIKE $1 OR full_name ILIKE $1)
                "#,
            )
            .bind(&pattern)
            .fetch_one(&self.pool),
        )
        .await?;

        // Column and direction come from a closed enum, never from raw input.
        let sql = format!(
            r#"
            SELECT id, username, password_hash, full_name, birthday, role, created_at, updated_at
            FROM users
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR username ILIKE $1 OR full_name ILIKE $1)
            ORDER BY {column} {direction}, id {direction}
            LIMIT $2 OFFSET $3
            "#,
            column = pagination.sort.column.as_str(),
            direction = pagination.sort.direction.as_str(),
        );

        let rows: Vec<UserRow> = within_deadline(
            ctx,
            "list users",
            sqlx::query_as(&sql)
                .bind(&pattern)
                .bind(i64::from(pagination.limit))
                .bind(pagination.offset())
                .fetch_all(&self.pool),
        )
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total_rows))
    }
}
