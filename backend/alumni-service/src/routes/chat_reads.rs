use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{ChatReadRequest, ChatReadResponse, UnreadCount, UnreadCountResponse};
use crate::state::AppState;
use crate::websocket::{publish, Topic, WsEvent};

#[post("/api/chats/{chatId}/read")]
pub async fn acknowledge(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ChatReadRequest>,
) -> AppResult<HttpResponse> {
    let chat_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;
    let (Some(user_id), Some(message_id)) = (req.user_id, req.last_read_message_id) else {
        return Err(AppError::BadRequest(
            "userId and lastReadMessageId are required".to_string(),
        ));
    };

    let mark = state
        .read_receipts
        .acknowledge(chat_id, user_id, message_id)
        .await?;

    publish(
        &state.registry,
        Topic::Chat(chat_id),
        &WsEvent::ReadReceipt {
            chat_id,
            user_id,
            last_read_message_id: mark.last_acknowledged_message_id,
        },
    )
    .await;
    Ok(HttpResponse::Ok().json(ChatReadResponse::from(mark)))
}

#[get("/api/chats/{chatId}/last-read/{userId}")]
pub async fn last_read(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (chat_id, user_id) = path.into_inner();
    let mark = state.read_receipts.get_mark(chat_id, user_id).await?;
    Ok(HttpResponse::Ok().json(ChatReadResponse::from(mark)))
}

#[get("/api/chats/{chatId}/unread-count/{userId}")]
pub async fn unread_count(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (chat_id, user_id) = path.into_inner();
    let unread_count = state.read_receipts.get_unread_count(chat_id, user_id).await?;
    Ok(HttpResponse::Ok().json(UnreadCountResponse::new(
        user_id,
        UnreadCount {
            conversation_id: chat_id,
            unread_count,
        },
    )))
}

#[get("/api/chats/unread-counts/{userId}")]
pub async fn unread_counts(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let counts: Vec<UnreadCountResponse> = state
        .read_receipts
        .get_unread_counts(user_id)
        .await?
        .into_iter()
        .map(|count| UnreadCountResponse::new(user_id, count))
        .collect();
    Ok(HttpResponse::Ok().json(counts))
}
