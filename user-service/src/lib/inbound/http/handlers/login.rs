use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::context::RequestContext;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<LoginRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .user_service
        .login(&ctx, &body.username, &body.password)
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|result| {
            ApiSuccess::new(
                StatusCode::OK,
                LoginResponseData {
                    token: result.access_token,
                },
            )
        })
}

/// Credentials as posted by the client; deliberately not `Debug`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub token: String,
}
