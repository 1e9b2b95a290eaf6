use quiz_core::QuizError;
use quiz_types::{ErrorKind, ErrorResponse};
use thiserror::Error;
use warp::http::StatusCode;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Session for {user_id} is no longer running")]
    SessionUnavailable { user_id: String },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Quiz(QuizError::InvalidInput(_)) => ErrorKind::InvalidInput,
            ApiError::Quiz(QuizError::NotStarted) => ErrorKind::NotStarted,
            ApiError::Quiz(QuizError::EmptyBank) => ErrorKind::EmptyBank,
            ApiError::Quiz(QuizError::QuestionNotFound { .. }) => ErrorKind::NotFound,
            ApiError::Quiz(QuizError::Persistence { .. }) => ErrorKind::Persistence,
            ApiError::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                ErrorKind::AuthenticationRequired
            }
            ApiError::Auth(AuthError::Forbidden) => ErrorKind::Forbidden,
            ApiError::SessionUnavailable { .. } => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::NotStarted => StatusCode::CONFLICT,
            ErrorKind::EmptyBank | ErrorKind::Persistence => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            error: self.to_string(),
        }
    }
}
