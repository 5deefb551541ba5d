use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::common::MessageResponse;
use crate::service::ServiceError;

pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug)]
pub enum AppError {
    /// 404 `{"message": "User not found"}`
    NotFound,
    /// 400 `{"error": ...}` carrying the raw cause
    BadRequest(String),
    InternalServerError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => AppError::NotFound,
            ServiceError::Store(message) => AppError::BadRequest(message),
            ServiceError::Serialization(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(MessageResponse::new(USER_NOT_FOUND)),
                )
                    .into_response();
            }
            AppError::BadRequest(error) => (StatusCode::BAD_REQUEST, error),
            AppError::InternalServerError(error) => (StatusCode::INTERNAL_SERVER_ERROR, error),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
