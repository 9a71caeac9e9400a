use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::i18n::Catalog;
use crate::i18n::Locale;
use crate::i18n::MessageKey;
use crate::user::errors::UserError;

pub mod create_user;
pub mod delete_user;
pub mod get_user;
pub mod list_users;
pub mod login;
pub mod update_user;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Client-facing failure; every variant renders as `{"error": {...}}`.
///
/// Messages are already localized when the error is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Validation(BTreeMap<String, String>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    InternalServerError(String),
}

impl ApiError {
    /// Map a domain error to its status and localized message.
    ///
    /// Infrastructure detail is logged here and replaced by a generic text.
    pub fn from_user_error(err: UserError, catalog: &Catalog, locale: Locale) -> Self {
        let message = |key: MessageKey| catalog.message(locale, key);

        match err {
            UserError::Validation(report) => ApiError::Validation(report.localize(catalog, locale)),
            UserError::NotFound(_) => ApiError::NotFound(message(MessageKey::NotFound)),
            UserError::UnknownUsername(_) => {
                ApiError::Unauthorized(message(MessageKey::InvalidUsernamePassword))
            }
            UserError::PasswordMismatch => {
                ApiError::BadRequest(message(MessageKey::InvalidUsernamePassword))
            }
            UserError::TokenCreation(e) => {
                tracing::error!(error = %e, "Token creation failed");
                ApiError::BadRequest(message(MessageKey::FailCreateToken))
            }
            UserError::CreateFailed(_) => ApiError::BadRequest(message(MessageKey::CreateFail)),
            UserError::UpdateFailed(_) => ApiError::BadRequest(message(MessageKey::UpdateFail)),
            UserError::DeleteFailed(_) => ApiError::BadRequest(message(MessageKey::DeleteFail)),
            UserError::DatabaseError(e) | UserError::Internal(e) => {
                tracing::error!(error = %e, "Request failed with internal error");
                ApiError::InternalServerError(message(MessageKey::InternalError))
            }
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: String) -> Self {
        ApiError::Validation(BTreeMap::from([(field.to_string(), message)]))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, data) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ApiErrorData::message(message)),
            ApiError::Validation(fields) => (StatusCode::BAD_REQUEST, ApiErrorData::Fields(fields)),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, ApiErrorData::message(message))
            }
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, ApiErrorData::message(message)),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ApiErrorData::message(message)),
            ApiError::InternalServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ApiErrorData::message(message))
            }
        };

        (status, Json(ApiErrorBody { error: data })).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiErrorData {
    Message { message: String },
    Fields(BTreeMap<String, String>),
}

impl ApiErrorData {
    fn message(message: String) -> Self {
        ApiErrorData::Message { message }
    }
}
