use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::context::RequestContext;
use crate::domain::pagination::Page;
use crate::domain::pagination::Pagination;
use crate::domain::pagination::Sort;
use crate::domain::user::models::User;
use crate::i18n::MessageKey;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<ApiSuccess<ListUsersResponseData>, ApiError> {
    let Query(query) = query?;

    let sort = match query.sort.as_deref().map(str::trim) {
        None | Some("") => Sort::default(),
        Some(raw) => raw.parse::<Sort>().map_err(|e| {
            tracing::debug!(request_id = %ctx.request_id(), error = %e, "Rejected sort");
            ApiError::invalid_field("sort", state.message(&ctx, MessageKey::InvalidValue))
        })?,
    };
    let pagination = Pagination::new(query.limit, query.page, sort);

    state
        .user_service
        .list_users(&ctx, pagination, query.search)
        .await
        .map_err(|e| state.api_error(&ctx, e))
        .map(|ref page| ApiSuccess::new(StatusCode::OK, page.into()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListUsersQuery {
    search: Option<String>,
    limit: Option<i64>,
    page: Option<i64>,
    sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUsersResponseData {
    pub limit: u32,
    pub page: u32,
    pub sort: String,
    pub total_rows: i64,
    pub total_pages: i64,
    pub result: Vec<UserListItemData>,
}

impl From<&Page<User>> for ListUsersResponseData {
    fn from(page: &Page<User>) -> Self {
        Self {
            limit: page.pagination.limit,
            page: page.pagination.page,
            sort: page.pagination.sort.to_string(),
            total_rows: page.total_rows,
            total_pages: page.total_pages,
            result: page.items.iter().map(UserListItemData::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserListItemData {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub birthday: Option<NaiveDate>,
}

impl From<&User> for UserListItemData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
            birthday: user.birthday,
        }
    }
}
