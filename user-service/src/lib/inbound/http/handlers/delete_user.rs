use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::get_user::parse_user_id;
use super::ApiError;
use crate::context::RequestContext;
use crate::inbound::http::router::AppState;

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&state, &ctx, &user_id)?;

    state
        .user_service
        .delete_user(&ctx, user_id)
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|_| StatusCode::NO_CONTENT)
}
