use actix_web::{delete, get, post, web, HttpResponse};

use crate::error::AppResult;
use crate::models::{ActingUserQuery, GroupMessagesQuery, SendGroupMessageRequest};
use crate::state::AppState;

#[post("/api/groups/{groupId}/messages")]
pub async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<SendGroupMessageRequest>,
) -> AppResult<HttpResponse> {
    let message = state
        .group_messages
        .send(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

#[get("/api/groups/{groupId}/messages")]
pub async fn list_messages(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<GroupMessagesQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .group_messages
        .list(path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[delete("/api/groups/{groupId}/messages/{messageId}")]
pub async fn delete_message(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
    query: web::Query<ActingUserQuery>,
) -> AppResult<HttpResponse> {
    let (group_id, message_id) = path.into_inner();
    state
        .group_messages
        .delete(group_id, message_id, query.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
