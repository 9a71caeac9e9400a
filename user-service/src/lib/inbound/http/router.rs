use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::header;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::MakeRequestUuid;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::request_id::SetRequestIdLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::update_user::update_user;
use super::handlers::ApiError;
use super::middleware::authorize;
use super::middleware::request_context;
use super::middleware::RoleGate;
use crate::context::RequestContext;
use crate::domain::user::models::Role;
use crate::i18n::Catalog;
use crate::i18n::MessageKey;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// Roles allowed to create and delete users.
pub const MANAGERS: &[Role] = &[Role::Admin, Role::Staff];

/// Roles allowed to read and update users.
pub const EVERYONE: &[Role] = &[Role::Admin, Role::Staff, Role::Customer];

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub catalog: Arc<Catalog>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        user_service: Arc<dyn UserServicePort>,
        authenticator: Arc<Authenticator>,
        catalog: Arc<Catalog>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            user_service,
            authenticator,
            catalog,
            request_timeout,
        }
    }

    /// Message text in the request's language.
    pub fn message(&self, ctx: &RequestContext, key: MessageKey) -> String {
        self.catalog.message(ctx.locale(), key)
    }

    /// Localized client error for a domain failure.
    pub fn api_error(&self, ctx: &RequestContext, err: UserError) -> ApiError {
        ApiError::from_user_error(err, &self.catalog, ctx.locale())
    }
}

pub fn create_router(state: AppState) -> Router {
    let gate = |allowed: &'static [Role]| {
        middleware::from_fn_with_state(RoleGate::new(state.clone(), allowed), authorize)
    };

    let api = Router::new()
        .route("/api/v1/authen/login", post(login))
        .route("/api/v1/users", post(create_user).route_layer(gate(MANAGERS)))
        .route("/api/v1/users", get(list_users).route_layer(gate(EVERYONE)))
        .route("/api/v1/users/:id", get(get_user).route_layer(gate(EVERYONE)))
        .route("/api/v1/users/:id", put(update_user).route_layer(gate(EVERYONE)))
        .route("/api/v1/users/:id", delete(delete_user).route_layer(gate(MANAGERS)));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                let language = response
                    .headers()
                    .get(header::CONTENT_LANGUAGE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();

                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    language,
                    "Request completed"
                );
            },
        );

    api.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(trace_layer)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CorsLayer::permissive())
            .layer(middleware::from_fn_with_state(state.clone(), request_context)),
    )
    .with_state(state)
}
