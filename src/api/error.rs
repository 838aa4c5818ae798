use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::attendance::TransitionError;
use crate::model::settings::ExpectedStartError;

/// Failures surfaced to clients as `{ "message": ... }` with a status.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Transition(TransitionError),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),
    #[display(fmt = "Failed to build report export")]
    Export(String),
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Transition(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database error");
        ApiError::Database(e)
    }
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        ApiError::Transition(e)
    }
}

impl From<ExpectedStartError> for ApiError {
    fn from(e: ExpectedStartError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// MySQL reports unique-key violations as SQLSTATE 23000.
pub fn is_duplicate(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn transition_errors_are_bad_requests() {
        let err = ApiError::from(TransitionError::LunchInProgress);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Lunch still in progress");
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
        assert!(!is_duplicate(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn bad_expected_start_is_a_client_error() {
        let err = ApiError::from("7am".parse::<crate::model::settings::ExpectedStart>().unwrap_err());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
