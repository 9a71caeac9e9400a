use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationResult;
use auth::Authenticator;
use axum::body::Body;
use axum::http::header;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use chrono::NaiveDate;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;
use user_admin::context::RequestContext;
use user_admin::domain::pagination::Page;
use user_admin::domain::pagination::Pagination;
use user_admin::domain::pagination::SortColumn;
use user_admin::domain::pagination::SortDirection;
use user_admin::domain::user::errors::UserError;
use user_admin::domain::user::models::CreateUserInput;
use user_admin::domain::user::models::NewUser;
use user_admin::domain::user::models::Role;
use user_admin::domain::user::models::UpdateUserInput;
use user_admin::domain::user::models::User;
use user_admin::domain::user::models::UserChanges;
use user_admin::domain::user::models::UserId;
use user_admin::domain::user::ports::UserRepository;
use user_admin::domain::user::ports::UserServicePort;
use user_admin::domain::user::service::UserService;
use user_admin::i18n::Catalog;
use user_admin::inbound::http::router::create_router;
use user_admin::inbound::http::router::AppState;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Fixed "today" so birthday rules do not drift.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

struct StoredUser {
    user: User,
    deleted: bool,
}

/// Store double with the same visibility rules as the Postgres adapter.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<StoredUser>>,
    lookups_fail: AtomicBool,
}

impl InMemoryUserRepository {
    /// Make every subsequent single-user lookup fail like a dropped connection.
    pub fn fail_lookups(&self) {
        self.lookups_fail.store(true, Ordering::SeqCst);
    }

    fn check_lookup(&self) -> Result<(), UserError> {
        if self.lookups_fail.load(Ordering::SeqCst) {
            return Err(UserError::DatabaseError("connection reset".to_string()));
        }
        Ok(())
    }

    fn live(&self) -> Vec<User> {
        self.rows
            .lock()
            .expect("repository lock poisoned")
            .iter()
            .filter(|row| !row.deleted)
            .map(|row| row.user.clone())
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, _ctx: &RequestContext, user: NewUser) -> Result<User, UserError> {
        let mut rows = self.rows.lock().expect("repository lock poisoned");
        let now = Utc::now();
        let user = User {
            id: UserId(rows.len() as i64 + 1),
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            birthday: user.birthday,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        rows.push(StoredUser {
            user: user.clone(),
            deleted: false,
        });
        Ok(user)
    }

    async fn find_by_id(
        &self,
        _ctx: &RequestContext,
        id: UserId,
    ) -> Result<Option<User>, UserError> {
        self.check_lookup()?;
        Ok(self.live().into_iter().find(|user| user.id == id))
    }

    async fn find_by_username(
        &self,
        _ctx: &RequestContext,
        username: &str,
    ) -> Result<Option<User>, UserError> {
        self.check_lookup()?;
        Ok(self.live().into_iter().find(|user| user.username == username))
    }

    async fn username_taken(
        &self,
        _ctx: &RequestContext,
        username: &str,
        exclude: Option<UserId>,
    ) -> Result<bool, UserError> {
        Ok(self
            .live()
            .iter()
            .any(|user| user.username == username && Some(user.id) != exclude))
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, UserError> {
        let mut rows = self.rows.lock().expect("repository lock poisoned");
        let row = rows
            .iter_mut()
            .find(|row| !row.deleted && row.user.id == id)
            .ok_or(UserError::NotFound(id))?;

        let user = &mut row.user;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(birthday) = changes.birthday {
            user.birthday = Some(birthday);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: UserId) -> Result<(), UserError> {
        let mut rows = self.rows.lock().expect("repository lock poisoned");
        let row = rows
            .iter_mut()
            .find(|row| !row.deleted && row.user.id == id)
            .ok_or(UserError::NotFound(id))?;
        row.deleted = true;
        Ok(())
    }

    async fn list(
        &self,
        _ctx: &RequestContext,
        pagination: &Pagination,
        search: Option<String>,
    ) -> Result<(Vec<User>, i64), UserError> {
        let needle = search.map(|term| term.to_lowercase());
        let mut users: Vec<User> = self
            .live()
            .into_iter()
            .filter(|user| match &needle {
                None => true,
                Some(needle) => {
                    user.username.to_lowercase().contains(needle)
                        || user
                            .full_name
                            .as_deref()
                            .is_some_and(|name| name.to_lowercase().contains(needle))
                }
            })
            .collect();

        users.sort_by(|a, b| {
            let ordering = match pagination.sort.column {
                SortColumn::Username => a.username.cmp(&b.username),
                SortColumn::FullName => a.full_name.cmp(&b.full_name),
                SortColumn::Role => a.role.as_str().cmp(b.role.as_str()),
                SortColumn::Birthday => a.birthday.cmp(&b.birthday),
                SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
                SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortColumn::Id => a.id.cmp(&b.id),
            }
            .then(a.id.cmp(&b.id));
            match pagination.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = users.len() as i64;
        let items = users
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok((items, total))
    }
}

/// Service whose every call hangs, for exercising the request deadline.
pub struct StalledUserService;

#[async_trait]
impl UserServicePort for StalledUserService {
    async fn create_user(
        &self,
        _ctx: &RequestContext,
        _input: CreateUserInput,
    ) -> Result<User, UserError> {
        std::future::pending().await
    }

    async fn get_user(&self, _ctx: &RequestContext, _id: UserId) -> Result<User, UserError> {
        std::future::pending().await
    }

    async fn get_user_by_username(
        &self,
        _ctx: &RequestContext,
        _username: &str,
    ) -> Result<User, UserError> {
        std::future::pending().await
    }

    async fn list_users(
        &self,
        _ctx: &RequestContext,
        _pagination: Pagination,
        _search: Option<String>,
    ) -> Result<Page<User>, UserError> {
        std::future::pending().await
    }

    async fn update_user(
        &self,
        _ctx: &RequestContext,
        _id: UserId,
        _input: UpdateUserInput,
    ) -> Result<User, UserError> {
        std::future::pending().await
    }

    async fn delete_user(&self, _ctx: &RequestContext, _id: UserId) -> Result<(), UserError> {
        std::future::pending().await
    }

    async fn login(
        &self,
        _ctx: &RequestContext,
        _username: &str,
        _password: &str,
    ) -> Result<AuthenticationResult, UserError> {
        std::future::pending().await
    }
}

pub fn test_authenticator() -> Arc<Authenticator> {
    Arc::new(Authenticator::new(
        JWT_SECRET,
        "user-admin",
        chrono::Duration::hours(1),
    ))
}

/// Router over any service implementation.
pub fn router_for(
    service: Arc<dyn UserServicePort>,
    authenticator: Arc<Authenticator>,
    request_timeout: Duration,
) -> Router {
    let catalog = Arc::new(Catalog::embedded().expect("embedded catalog parses"));
    create_router(AppState::new(
        service,
        authenticator,
        catalog,
        request_timeout,
    ))
}

/// Router wired to a real service over the in-memory store.
pub struct TestApp {
    pub router: Router,
    pub repository: Arc<InMemoryUserRepository>,
    pub service: Arc<UserService<InMemoryUserRepository>>,
    pub authenticator: Arc<Authenticator>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: serde_json::Value,
}

impl TestApp {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryUserRepository::default());
        let authenticator = test_authenticator();
        let service = Arc::new(
            UserService::new(
                Arc::clone(&repository),
                Arc::clone(&authenticator),
                Duration::from_millis(700),
            )
            .with_clock(today),
        );

        Self {
            router: router_for(
                service.clone(),
                Arc::clone(&authenticator),
                Duration::from_secs(10),
            ),
            repository,
            service,
            authenticator,
        }
    }

    /// Store a user through the service and return its id.
    pub async fn seed_user(&self, username: &str, password: &str, role: Role) -> UserId {
        let ctx = RequestContext::background(Duration::from_secs(10));
        let input = CreateUserInput {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            full_name: Some(format!("{} full name", username)),
            role: Some(role.as_str().to_string()),
            birthday: Some("1990-05-20".to_string()),
        };
        self.service
            .create_user(&ctx, input)
            .await
            .expect("Failed to seed user")
            .id
    }

    /// Seed a user and mint a bearer token for it.
    pub async fn seed_token(&self, username: &str, role: Role) -> String {
        let id = self.seed_user(username, "password123", role).await;
        self.token_for(username, id, role)
    }

    pub fn token_for(&self, username: &str, id: UserId, role: Role) -> String {
        self.authenticator
            .issue_token(username, id.0, role.as_str())
            .expect("Failed to issue token")
            .access_token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        self.request_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        send(
            &self.router,
            build_request(method, uri, token, body, headers),
        )
        .await
    }
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
    headers: &[(&str, &str)],
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request")
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
