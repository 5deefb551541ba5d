use serde::Deserialize;

use crate::error::AppError;
use crate::service::UserChanges;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl CreateUserRequest {
    /// Presence check only; content is validated by the store.
    pub fn into_fields(self) -> Result<(String, String), AppError> {
        let username = self
            .username
            .ok_or_else(|| AppError::BadRequest("missing field: username".to_string()))?;
        let email = self
            .email
            .ok_or_else(|| AppError::BadRequest("missing field: email".to_string()))?;
        Ok((username, email))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            username: req.username,
            email: req.email,
        }
    }
}
