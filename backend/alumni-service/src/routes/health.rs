use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::config::SERVICE_NAME;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Ready once storage answers. Always ready on the in-memory store.
#[get("/health/ready")]
pub async fn readiness(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    if let Some(pool) = &state.db {
        db_pool::health_check(pool).await?;
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "ready" })))
}

#[get("/metrics")]
pub async fn metrics() -> AppResult<HttpResponse> {
    let body = actix_middleware::render_metrics()
        .map_err(|e| AppError::Internal(format!("failed to encode metrics: {}", e)))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}
