use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use tokio::time::Instant;

use crate::context::RequestContext;
use crate::domain::user::models::Principal;
use crate::domain::user::models::Role;
use crate::i18n::Locale;
use crate::i18n::MessageKey;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

#[derive(Debug, Default, Deserialize)]
struct LanguageQuery {
    lang: Option<String>,
}

/// Middleware that builds the per-request context (id, language, deadline)
/// and stores it in the request extensions.
///
/// A request still running at its deadline answers 500 `INTERNAL_ERROR`.
pub async fn request_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let lang = Query::<LanguageQuery>::try_from_uri(req.uri())
        .map(|Query(query)| query)
        .unwrap_or_default()
        .lang;
    let accept_language = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let locale = Locale::negotiate(lang.as_deref(), accept_language);

    let deadline = Instant::now() + state.request_timeout;
    let ctx = RequestContext::new(request_id.clone(), locale, deadline);
    req.extensions_mut().insert(ctx);

    // The handler future is dropped at the deadline, cancelling any in-flight query.
    let mut response = match tokio::time::timeout_at(deadline, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                request_id = %request_id,
                timeout_ms = state.request_timeout.as_millis() as u64,
                "Request exceeded its deadline"
            );
            ApiError::InternalServerError(state.catalog.message(locale, MessageKey::InternalError))
                .into_response()
        }
    };
    response.headers_mut().insert(
        header::CONTENT_LANGUAGE,
        HeaderValue::from_static(locale.as_str()),
    );
    response
}

/// Per-route role allow-list enforced by [`authorize`].
#[derive(Clone)]
pub struct RoleGate {
    state: AppState,
    allowed: &'static [Role],
}

impl RoleGate {
    pub fn new(state: AppState, allowed: &'static [Role]) -> Self {
        Self { state, allowed }
    }
}

/// Middleware that verifies the bearer token, loads the principal and
/// checks its stored role against the route's allow-list.
///
/// Any failure short-circuits before the handler runs.
pub async fn authorize(State(gate): State<RoleGate>, mut req: Request, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        tracing::error!("Request context missing, is the context layer installed?");
        return ApiError::InternalServerError(
            gate.state.catalog.message(Locale::default(), MessageKey::InternalError),
        )
        .into_response();
    };

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match resolve_principal(&gate, authorization.as_deref(), &ctx).await {
        Ok(principal) => {
            req.extensions_mut().insert(ctx.with_principal(principal));
            next.run(req).await
        }
        Err(error) => error.into_response(),
    }
}

async fn resolve_principal(
    gate: &RoleGate,
    authorization: Option<&str>,
    ctx: &RequestContext,
) -> Result<Principal, ApiError> {
    let state = &gate.state;

    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized(state.message(ctx, MessageKey::InvalidAuthorHeader)))?;

    let claims = state.authenticator.validate_token(token).map_err(|e| {
        tracing::warn!(request_id = %ctx.request_id(), error = %e, "JWT validation failed");
        ApiError::Unauthorized(e.to_string())
    })?;

    if claims.sub.is_empty() {
        return Err(ApiError::Unauthorized(state.message(ctx, MessageKey::InvalidClaim)));
    }

    let user = state
        .user_service
        .get_user_by_username(ctx, &claims.sub)
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %ctx.request_id(), error = %e, "Principal lookup failed");
            ApiError::Unauthorized(state.message(ctx, MessageKey::AuthenRequire))
        })?;

    // A username freed by a soft delete may now belong to someone else.
    if user.id.0 != claims.id {
        tracing::warn!(
            request_id = %ctx.request_id(),
            token_user_id = claims.id,
            user_id = %user.id,
            "Token subject no longer matches the stored user"
        );
        return Err(ApiError::Unauthorized(state.message(ctx, MessageKey::AuthenRequire)));
    }

    if !gate.allowed.contains(&user.role) {
        tracing::info!(
            request_id = %ctx.request_id(),
            user_id = %user.id,
            role = %user.role,
            "Role not permitted on route"
        );
        return Err(ApiError::Forbidden(state.message(ctx, MessageKey::PermissionRequire)));
    }

    Ok(Principal::from(&user))
}
