use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use storesync_core::errors::{DatabaseError, Error as CoreError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

/// Body of every failed request.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: u16,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
                CoreError::Configuration(_) => StatusCode::BAD_REQUEST,
                CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::SyncInProgress(_) | CoreError::RunAlreadyFinalized(_) => {
                    StatusCode::CONFLICT
                }
                CoreError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
                CoreError::Persistence(_) | CoreError::Database(_) | CoreError::Unexpected(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            success: false,
            error: self.to_string(),
            code: status.as_u16(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (CoreError::NotFound("none".into()), StatusCode::NOT_FOUND),
            (CoreError::Configuration("off".into()), StatusCode::BAD_REQUEST),
            (CoreError::SyncInProgress("t1".into()), StatusCode::CONFLICT),
            (CoreError::RunAlreadyFinalized("r1".into()), StatusCode::CONFLICT),
            (CoreError::Persistence("gone".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                CoreError::Database(DatabaseError::NotFound("c9".into())),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
