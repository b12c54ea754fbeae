// rest/error.rs — domain-error to HTTP mapping.
//
// Every handler returns `Result<_, ApiError>`; the `From` impls below are
// the single place where domain errors pick their status code and JSON body.
// Storage failures always surface as a generic 500 — the cause goes to the
// log, not the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::AuthError;
use crate::pets::PetError;
use crate::quests::QuestError;
use crate::reflections::ReflectionError;
use crate::uploads::UploadError;

pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(err: &anyhow::Error) -> Self {
        error!("request failed: {err:#}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(&err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::UsernameTaken | AuthError::EmailTaken => {
                ApiError::new(StatusCode::CONFLICT, &err.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::unauthorized(&err.to_string())
            }
            AuthError::Validation(msg) => ApiError::bad_request(msg),
            AuthError::Hash(_) => {
                error!("auth failure: {err}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
            AuthError::Storage(source) => ApiError::internal(source),
        }
    }
}

impl From<QuestError> for ApiError {
    fn from(err: QuestError) -> Self {
        match &err {
            QuestError::UnknownQuest => ApiError::not_found(&err.to_string()),
            QuestError::UnknownCategory(_) => ApiError::bad_request(&err.to_string()),
            QuestError::CategoryCompleted(_) => {
                ApiError::new(StatusCode::CONFLICT, &err.to_string())
            }
            QuestError::Storage(source) => ApiError::internal(source),
        }
    }
}

impl From<ReflectionError> for ApiError {
    fn from(err: ReflectionError) -> Self {
        match &err {
            ReflectionError::EmptyText => ApiError::bad_request(&err.to_string()),
            ReflectionError::UnknownQuest => ApiError::not_found(&err.to_string()),
            ReflectionError::Storage(source) => ApiError::internal(source),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match &err {
            UploadError::DisallowedExtension(_)
            | UploadError::Empty
            | UploadError::TooLarge { .. } => ApiError::bad_request(&err.to_string()),
            UploadError::Storage(source) => ApiError::internal(source),
        }
    }
}

// Pet endpoints answer in the mini-game UI's envelope, so their errors carry
// `success: false` instead of the plain `error` body.
impl From<PetError> for ApiError {
    fn from(err: PetError) -> Self {
        let status = match &err {
            PetError::UnknownPet(_) | PetError::NonPositivePoints => StatusCode::BAD_REQUEST,
            PetError::NoActivePet
            | PetError::InsufficientXp { .. }
            | PetError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            PetError::Storage(source) => {
                error!("pet operation failed: {source:#}");
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: json!({ "success": false, "error": "internal error" }),
                };
            }
        };
        Self {
            status,
            body: json!({ "success": false, "error": err.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_username_maps_to_conflict() {
        let err = ApiError::from(AuthError::UsernameTaken);
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body["error"], "username is already taken");
    }

    #[test]
    fn pet_errors_use_the_success_envelope() {
        let err = ApiError::from(PetError::CapacityExceeded { max_points: 1 });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body["success"], false);
        assert!(err.body["error"]
            .as_str()
            .unwrap()
            .contains("at most 1 more points"));
    }

    #[test]
    fn storage_errors_hide_the_cause() {
        let err = ApiError::from(QuestError::Storage(anyhow::anyhow!("db on fire")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body["error"], "internal error");
    }
}
