//! Typed errors and HTTP mapping.

use crate::response::error_body;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid bind address '{0}'")]
    BindAddr(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Referential(String),
    #[error("{0}")]
    Ownership(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
}

impl AppError {
    /// Replace the generic reason of a unique violation with an entity-specific one.
    pub fn on_conflict(self, reason: impl Into<String>) -> Self {
        match self {
            AppError::Conflict(_) => AppError::Conflict(reason.into()),
            other => other,
        }
    }

    /// Replace the generic reason of a foreign-key violation.
    pub fn on_referential(self, reason: impl Into<String>) -> Self {
        match self {
            AppError::Referential(_) => AppError::Referential(reason.into()),
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::Referential(_)
            | AppError::Ownership(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(format!(
                "unique constraint violated: {}",
                db_err.constraint().unwrap_or("unknown")
            )),
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => AppError::Referential(format!(
                "referenced row is missing: {}",
                db_err.constraint().unwrap_or("unknown")
            )),
            other => AppError::Db(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = match &self {
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                "internal database error".to_string()
            }
            other => {
                tracing::debug!(status = %status, reason = %other, "request failed");
                other.to_string()
            }
        };
        (status, Json(error_body(reason))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_reason_is_replaced() {
        let err = AppError::Conflict("unique constraint violated: template_type_key".into())
            .on_conflict("Template with such type already exists");
        assert_eq!(err.to_string(), "Template with such type already exists");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_variants_keep_their_reason() {
        let err = AppError::NotFound("Template 3 doesn't exist".into()).on_conflict("ignored");
        assert_eq!(err.to_string(), "Template 3 doesn't exist");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Db(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn ownership_maps_to_bad_request() {
        let err = AppError::Ownership("Workspace 2 does not belong to user 1".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
