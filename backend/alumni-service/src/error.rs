use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a request can end in. Mapped to HTTP once, in
/// [`ResponseError`] below.
#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AppError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn user_not_found(user_id: i64) -> Self {
        Self::not_found(
            error_codes::USER_NOT_FOUND,
            format!("User not found with id: {}", user_id),
        )
    }

    pub fn not_a_member() -> Self {
        AppError::Forbidden("User is not a participant of this conversation".to_string())
    }

    /// Storage outages are worth retrying; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { code, .. } | AppError::Conflict { code, .. } => *code,
            AppError::BadRequest(_) => error_codes::BAD_REQUEST,
            AppError::Validation(_) => error_codes::VALIDATION_FAILED,
            AppError::Unauthorized(_) => error_codes::MISSING_USER_HEADER,
            AppError::Forbidden(_) => error_codes::FORBIDDEN,
            AppError::Database(_) => error_codes::DATABASE_ERROR,
            AppError::StorageUnavailable(_) => error_codes::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => error_codes::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => kinds::NOT_FOUND_ERROR,
            AppError::BadRequest(_) | AppError::Validation(_) => kinds::VALIDATION_ERROR,
            AppError::Unauthorized(_) => kinds::AUTHENTICATION_ERROR,
            AppError::Forbidden(_) => kinds::AUTHORIZATION_ERROR,
            AppError::Conflict { .. } => kinds::CONFLICT_ERROR,
            AppError::StorageUnavailable(_) => kinds::SERVICE_UNAVAILABLE_ERROR,
            AppError::Database(_) | AppError::Internal(_) => kinds::SERVER_ERROR,
        }
    }

    /// Message shown to clients. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
            AppError::StorageUnavailable(_) => {
                "Storage is temporarily unavailable, please retry".to_string()
            }
            AppError::Validation(_) => "Request validation failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, retryable = self.is_retryable(), "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let mut body = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &self.public_message(),
            status.as_u16(),
            self.error_type(),
            self.code(),
        );
        if let AppError::Validation(details) = self {
            body = body.with_details(details.clone());
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::not_found(error_codes::NOT_FOUND, "Resource not found")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::StorageUnavailable(err.to_string())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(error_codes::CONFLICT, "Resource already exists")
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::BadRequest("Referenced resource does not exist".to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "content must not be empty"))]
        content: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::user_not_found(7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::conflict(error_codes::CONFLICT, "dup").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_only_storage_outage_is_retryable() {
        assert!(AppError::StorageUnavailable("timeout".into()).is_retryable());
        assert!(!AppError::Database("syntax".into()).is_retryable());
        assert!(!AppError::not_a_member().is_retryable());
    }

    #[test]
    fn test_pool_timeout_maps_to_storage_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::StorageUnavailable(_)));

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_errors_are_flattened() {
        let sample = Sample {
            content: String::new(),
        };
        let err: AppError = sample.validate().unwrap_err().into();
        match err {
            AppError::Validation(details) => {
                assert_eq!(details, "content: content must not be empty")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let resp = AppError::conflict(
            error_codes::CONNECTION_CONFLICT,
            "Connection request already sent",
        )
        .error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 409);
        assert_eq!(json["error"], "Conflict");
        assert_eq!(json["message"], "Connection request already sent");
        assert_eq!(json["code"], "CONNECTION_CONFLICT");
        assert_eq!(json["error_type"], "conflict_error");
    }

    #[actix_web::test]
    async fn test_database_details_are_hidden() {
        let resp = AppError::Database("relation \"users\" does not exist".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "An unexpected error occurred");
    }
}
