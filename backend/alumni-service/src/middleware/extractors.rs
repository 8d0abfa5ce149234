//! Extractor configs that render rejected bodies, queries and paths with
//! the same error body as every other failure.

use actix_web::{error::InternalError, web, HttpRequest, ResponseError};

use crate::error::AppError;

/// Request bodies are small JSON documents.
const JSON_LIMIT_BYTES: usize = 64 * 1024;

fn reject(message: String, cause: impl std::fmt::Display) -> actix_web::Error {
    tracing::debug!(error = %cause, "rejected request input");
    let err = AppError::BadRequest(message);
    InternalError::from_response(cause.to_string(), err.error_response()).into()
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req: &HttpRequest| {
            reject(format!("Invalid request body: {}", err), err)
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        reject(format!("Invalid query parameters: {}", err), err)
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        reject(format!("Invalid path parameter: {}", err), err)
    })
}
