use actix_web::{get, post, web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::ActingUser;
use crate::models::ConnectionMessage;
use crate::services::connections::REQUEST_SENT;
use crate::state::AppState;

#[post("/api/users/{targetUserId}/connect")]
pub async fn send_request(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    sender: ActingUser,
) -> AppResult<HttpResponse> {
    state
        .connections
        .send_request(sender.0, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ConnectionMessage::new(REQUEST_SENT)))
}

#[post("/api/connections/{id}/accept")]
pub async fn accept(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    user: ActingUser,
) -> AppResult<HttpResponse> {
    let connection = state.connections.accept(path.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(connection))
}

#[post("/api/connections/{id}/reject")]
pub async fn reject(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    user: ActingUser,
) -> AppResult<HttpResponse> {
    let connection = state.connections.reject(path.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(connection))
}

#[get("/api/users/{id}/connections")]
pub async fn list_connections(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let connections = state.connections.list_connections(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(connections))
}

#[get("/api/users/{id}/connection-requests")]
pub async fn list_pending(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let pending = state.connections.list_pending(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(pending))
}
