use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::get_user::parse_user_id;
use super::get_user::UserDetailData;
use super::ApiError;
use super::ApiSuccess;
use crate::context::RequestContext;
use crate::domain::user::models::UpdateUserInput;
use crate::inbound::http::router::AppState;

pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<ApiSuccess<UserDetailData>, ApiError> {
    let user_id = parse_user_id(&state, &ctx, &user_id)?;
    let Json(body) = body?;

    state
        .user_service
        .update_user(&ctx, user_id, body.into())
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// Partial update; omitted or empty fields keep their stored value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateUserRequest {
    username: Option<String>,
    password: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    birthday: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUserInput {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            full_name: request.full_name,
            role: request.role,
            birthday: request.birthday,
        }
    }
}
