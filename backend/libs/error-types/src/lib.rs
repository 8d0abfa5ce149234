use serde::{Deserialize, Serialize};

/// Unified JSON error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP reason phrase ("Not Found", "Conflict", ...)
    pub error: String,

    /// Human readable explanation
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Coarse error category for client-side routing, one of [`error_types`]
    pub error_type: String,

    /// Stable machine code, one of [`error_codes`]
    pub code: String,

    /// Extra detail (field errors for validation failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

pub mod error_codes {
    // Users
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";

    // Connections
    pub const CONNECTION_NOT_FOUND: &str = "CONNECTION_NOT_FOUND";
    pub const CONNECTION_CONFLICT: &str = "CONNECTION_CONFLICT";

    // Posts
    pub const POST_NOT_FOUND: &str = "POST_NOT_FOUND";

    // Chats and groups
    pub const GROUP_NOT_FOUND: &str = "GROUP_NOT_FOUND";
    pub const CHAT_NOT_FOUND: &str = "CHAT_NOT_FOUND";
    pub const MESSAGE_NOT_FOUND: &str = "MESSAGE_NOT_FOUND";

    // Generic
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const MISSING_USER_HEADER: &str = "MISSING_USER_HEADER";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const CONFLICT: &str = "CONFLICT";

    // Database/System
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const SERVER_ERROR: &str = "server_error";
    pub const SERVICE_UNAVAILABLE_ERROR: &str = "service_unavailable_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new(
            "Not Found",
            "User not found",
            404,
            error_types::NOT_FOUND_ERROR,
            error_codes::USER_NOT_FOUND,
        );

        assert_eq!(error.status, 404);
        assert_eq!(error.error_type, error_types::NOT_FOUND_ERROR);
        assert_eq!(error.code, error_codes::USER_NOT_FOUND);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let error = ErrorResponse::new(
            "Conflict",
            "User is already connected",
            409,
            error_types::CONFLICT_ERROR,
            error_codes::CONNECTION_CONFLICT,
        );
        let json = serde_json::to_value(&error).unwrap();
        assert!(json.get("details").is_none());

        let json = serde_json::to_value(error.with_details("x".into())).unwrap();
        assert_eq!(json["details"], "x");
    }
}
