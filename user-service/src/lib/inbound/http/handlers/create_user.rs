use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::get_user::UserDetailData;
use super::ApiError;
use super::ApiSuccess;
use crate::context::RequestContext;
use crate::domain::user::models::CreateUserInput;
use crate::inbound::http::router::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserDetailData>, ApiError> {
    let Json(body) = body?;

    state
        .user_service
        .create_user(&ctx, body.into())
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|ref user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

/// HTTP request body for creating a user (raw JSON)
///
/// Every field is optional at this layer so that missing values surface as
/// per-field validation messages rather than a binding error.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    username: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    birthday: Option<String>,
}

impl From<CreateUserRequest> for CreateUserInput {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            full_name: request.full_name,
            role: request.role,
            birthday: request.birthday,
        }
    }
}
