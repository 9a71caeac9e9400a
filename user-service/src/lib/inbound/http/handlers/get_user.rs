use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::context::RequestContext;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::i18n::MessageKey;
use crate::inbound::http::router::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<UserDetailData>, ApiError> {
    let user_id = parse_user_id(&state, &ctx, &user_id)?;

    state
        .user_service
        .get_user(&ctx, user_id)
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// Path id, or a 400 with the generic invalid-value message.
pub(super) fn parse_user_id(
    state: &AppState,
    ctx: &RequestContext,
    raw: &str,
) -> Result<UserId, ApiError> {
    UserId::from_string(raw)
        .map_err(|_| ApiError::BadRequest(state.message(ctx, MessageKey::InvalidValue)))
}

/// Full user representation returned by read and write endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetailData {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub birthday: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserDetailData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
            birthday: user.birthday,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
