use actix_web::{get, post, web, HttpResponse};

use crate::error::AppResult;
use crate::models::{ChatMessagesQuery, OpenChatRequest, SendChatMessageRequest};
use crate::state::AppState;

#[post("/api/chats")]
pub async fn open_chat(
    state: web::Data<AppState>,
    body: web::Json<OpenChatRequest>,
) -> AppResult<HttpResponse> {
    let chat = state.chats.open_chat(body.user1_id, body.user2_id).await?;
    Ok(HttpResponse::Ok().json(chat))
}

#[get("/api/chats/user/{userId}")]
pub async fn chats_for_user(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let chats = state.chats.chats_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(chats))
}

#[post("/api/chats/{chatId}/messages")]
pub async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<SendChatMessageRequest>,
) -> AppResult<HttpResponse> {
    let message = state
        .chats
        .send_message(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

#[get("/api/chats/{chatId}/messages")]
pub async fn list_messages(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ChatMessagesQuery>,
) -> AppResult<HttpResponse> {
    let messages = state
        .chats
        .messages(path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}
