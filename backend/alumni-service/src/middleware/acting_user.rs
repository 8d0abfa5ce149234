use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Caller identity taken from the `X-User-Id` header.
///
/// Missing header is 401, a value that is not a positive id is 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub i64);

impl ActingUser {
    fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let raw = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("{} header is required", USER_ID_HEADER)))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(ActingUser)
            .ok_or_else(|| AppError::BadRequest(format!("{} must be a positive integer", USER_ID_HEADER)))
    }
}

impl FromRequest for ActingUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_header_is_parsed() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, " 42 "))
            .to_http_request();
        let user = ActingUser::extract(&req).await.unwrap();
        assert_eq!(user, ActingUser(42));
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = ActingUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn test_malformed_header_is_bad_request() {
        for value in ["abc", "-3", "0"] {
            let req = TestRequest::default()
                .insert_header((USER_ID_HEADER, value))
                .to_http_request();
            let err = ActingUser::extract(&req).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "value {}", value);
        }
    }
}
