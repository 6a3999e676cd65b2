use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use sqlx::mysql::MySqlDatabaseError;

use crate::document::DocumentError;

/// Request-scoped failure; every variant renders as `{"message": ...}`.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(
        fmt = "You have exceeded the maximum allowed {} days. Maximum allowed: {} days, Already used/pending: {} days, Remaining days: {} days",
        leave_type,
        max_days,
        used_days,
        remaining_days
    )]
    LeaveCapExceeded {
        leave_type: String,
        max_days: i64,
        used_days: i64,
        remaining_days: i64,
    },

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),

    #[display(fmt = "Failed to generate document")]
    Document(DocumentError),
}

pub type AppResult<T> = Result<T, AppError>;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::LeaveCapExceeded { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::LeaveCapExceeded {
                max_days,
                used_days,
                remaining_days,
                ..
            } => json!({
                "message": self.to_string(),
                "max_days": max_days,
                "used_days": used_days,
                "remaining_days": remaining_days,
            }),
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_constraint_violation(&e) {
            return match mysql_error_number(&e) {
                Some(number) => constraint_error(number),
                None => AppError::Conflict("Record conflicts with an existing entry".to_string()),
            };
        }
        tracing::error!(error = %e, "Database error");
        AppError::Database(e)
    }
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        tracing::error!(error = %e, "Document generation failed");
        AppError::Document(e)
    }
}

/// SQLSTATE 23000: duplicate key or foreign key violation.
pub fn is_constraint_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
        _ => false,
    }
}

fn mysql_error_number(e: &sqlx::Error) -> Option<u16> {
    match e {
        sqlx::Error::Database(db_err) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number),
        _ => None,
    }
}

/// Maps a MySQL integrity error number (SQLSTATE 23000) to a response.
fn constraint_error(number: u16) -> AppError {
    match number {
        // no referenced parent row
        1216 | 1452 => AppError::Validation("Referenced record does not exist".to_string()),
        // parent row still referenced
        1217 | 1451 => AppError::Conflict("Record is still referenced by other records".to_string()),
        // NOT NULL column left empty
        1048 => AppError::Validation("A required field is missing".to_string()),
        _ => AppError::Conflict("Record conflicts with an existing entry".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn leave_cap_response_carries_counts() {
        let err = AppError::LeaveCapExceeded {
            leave_type: "Annual".to_string(),
            max_days: 10,
            used_days: 9,
            remaining_days: 1,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["max_days"], 10);
        assert_eq!(value["used_days"], 9);
        assert_eq!(value["remaining_days"], 1);
        assert!(value["message"].as_str().unwrap().contains("Remaining days: 1 days"));
    }

    #[test]
    fn row_not_found_is_not_a_conflict() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn forbidden_maps_to_403() {
        assert_eq!(
            AppError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn foreign_key_failures_are_not_conflicts() {
        assert_eq!(constraint_error(1452).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(constraint_error(1216).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(constraint_error(1048).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(constraint_error(1451).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn duplicate_keys_stay_conflicts() {
        let err = constraint_error(1062);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Record conflicts with an existing entry");
    }
}
