use axum::extract::{
    Json, Path, State,
    rejection::{JsonRejection, PathRejection},
};

use crate::{
    AppState,
    common::{MessageResponse, RawJson},
    error::AppError,
};

use super::model::{CreateUserRequest, UpdateUserRequest};

/// Only unsigned decimal segments name a user; anything else (signs,
/// negatives, overflow, non-digits) is treated as an unknown user.
fn user_id(path: Result<Path<String>, PathRejection>) -> Result<i32, AppError> {
    let Path(segment) = path.map_err(|_| AppError::NotFound)?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound);
    }
    segment.parse().map_err(|_| AppError::NotFound)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(req)| req)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let (username, email) = json_body(body)?.into_fields()?;

    state.users.create(&username, &email).await?;
    Ok(Json(MessageResponse::new("User created successfully")))
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<RawJson, AppError> {
    Ok(RawJson(state.users.list().await?))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<RawJson, AppError> {
    let id = user_id(path)?;
    Ok(RawJson(state.users.get(id).await?))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = user_id(path)?;
    // A missing user wins over a bad body
    let changes = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            state.users.ensure_exists(id).await?;
            return Err(AppError::BadRequest(rejection.body_text()));
        }
    };

    state.users.update(id, changes.into()).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = user_id(path)?;

    state.users.delete(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[axum::debug_handler]
pub async fn clear_user_cache(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = user_id(path)?;

    state.users.invalidate(id).await;
    Ok(Json(MessageResponse::new(format!(
        "Cache cleared for user {}",
        id
    ))))
}
